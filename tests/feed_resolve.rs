use gridpool::resolve::{resolve_feed, DriverResolver, FeedRace, SeasonRoster};

fn roster() -> SeasonRoster {
    SeasonRoster::new(["VER", "NOR", "LEC", "PIA", "HAM"])
        .with_alias("Verstappen", "VER")
        .with_alias("M. VERSTAPPEN", "VER")
}

#[test]
fn resolves_aliases_before_roster_matches() {
    let roster = roster();
    assert_eq!(roster.resolve("Verstappen").as_deref(), Ok("VER"));
    assert_eq!(roster.resolve("  m. verstappen ").as_deref(), Ok("VER"));
}

#[test]
fn resolves_exact_and_normalized_roster_tokens() {
    let roster = roster();
    assert_eq!(roster.tokens().len(), 5);
    assert_eq!(roster.resolve("NOR").as_deref(), Ok("NOR"));
    assert_eq!(roster.resolve(" nor ").as_deref(), Ok("NOR"));
}

#[test]
fn unknown_names_carry_the_feed_spelling_back() {
    let err = roster().resolve("Fangio").expect_err("not on the roster");
    assert_eq!(err.name, "Fangio");
}

#[test]
fn feed_records_map_into_official_results() {
    let feed = FeedRace {
        race_id: 4,
        podium: ["ver".to_string(), "Nor ".to_string(), "LEC".to_string()],
        sprint_podium: Some([
            "HAM".to_string(),
            "PIA".to_string(),
            "Verstappen".to_string(),
        ]),
        double_points: true,
    };

    let result = resolve_feed(&feed, &roster()).expect("all resolvable");
    assert_eq!(result.race_id, 4);
    assert_eq!(
        result.podium,
        Some(["VER".to_string(), "NOR".to_string(), "LEC".to_string()])
    );
    assert_eq!(
        result.sprint_podium,
        Some(["HAM".to_string(), "PIA".to_string(), "VER".to_string()])
    );
    assert!(result.double_points);
    assert!(!result.cancelled_main);
}

#[test]
fn one_unknown_name_fails_the_whole_feed_record() {
    let feed = FeedRace {
        race_id: 4,
        podium: ["VER".to_string(), "Fangio".to_string(), "LEC".to_string()],
        sprint_podium: None,
        double_points: false,
    };

    assert!(resolve_feed(&feed, &roster()).is_err());
}
