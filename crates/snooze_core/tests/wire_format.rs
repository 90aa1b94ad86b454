use snooze_core::{Story, UserProfile};

#[test]
fn story_deserializes_from_service_json_and_ignores_extra_fields() {
    let json = r#"{
        "storyId": "5081e46e-3143-4c0c-bbf4-c22eb11eb3f5",
        "title": "The Best Story Ever",
        "author": "Matt Lane",
        "url": "http://google.com/best/story",
        "username": "hueter",
        "createdAt": "2017-11-09T18:38:39.409Z",
        "updatedAt": "2017-11-09T18:38:39.409Z"
    }"#;

    let story: Story = serde_json::from_str(json).expect("story json");
    assert_eq!(story.story_id(), "5081e46e-3143-4c0c-bbf4-c22eb11eb3f5");
    assert_eq!(story.username(), "hueter");
    assert_eq!(story.hostname(), "google.com");
    assert_eq!(story.created_at().to_rfc3339(), "2017-11-09T18:38:39.409+00:00");
}

#[test]
fn profile_without_story_arrays_defaults_to_empty() {
    let json = r#"{
        "username": "alice",
        "name": "Alice A",
        "createdAt": "2024-01-01T00:00:00.000Z"
    }"#;

    let profile: UserProfile = serde_json::from_str(json).expect("profile json");
    assert_eq!(profile.username, "alice");
    assert!(profile.favorites.is_empty());
    assert!(profile.own_stories.is_empty());
}

#[test]
fn profile_reads_own_stories_from_stories_key() {
    let json = r#"{
        "username": "alice",
        "name": "Alice A",
        "createdAt": "2024-01-01T00:00:00.000Z",
        "favorites": [],
        "stories": [{
            "storyId": "s9",
            "title": "T",
            "author": "A",
            "url": "https://ex.com/x",
            "username": "alice",
            "createdAt": "2024-01-02T00:00:00.000Z"
        }]
    }"#;

    let profile: UserProfile = serde_json::from_str(json).expect("profile json");
    assert_eq!(profile.own_stories.len(), 1);
    assert_eq!(profile.own_stories[0].title(), "T");
}
