//! World registry, scenario loading and event feed tests

#[cfg(test)]
mod tests {
    use janet_chat::{
        channel::ChannelSet,
        event::ChatEvent,
        feed::run_feed,
        protocol::{ChatEnvelope, ChatUpdate},
        registry::{ChatRegistry, Recipient},
        relay::{ConnectionSink, ServerRelay},
        types::{ConnectionId, EntityId, EventOrigin, RegionId, RelayConfig, Vec2},
        world::{Body, Participant, Scenario, World},
        ChatError,
    };
    use parking_lot::Mutex;
    use std::path::PathBuf;
    use std::sync::Arc;

    const SCENARIO: &str = r#"
regions = [1]

[[participants]]
id = "alice"
connection = 1
region = 1
position = { x = 2.0, y = 0.0 }
channels = "OOC, Local, Common"

[[participants]]
id = "ghost"
connection = 2
position = { x = 90.0, y = 0.0 }
observer = true

[[participants]]
id = "lobby"
connection = 3

[[agents]]
id = "mouse"
position = { x = 1.0, y = 1.0 }

[[blockers]]
id = "hall-wall"
kind = "wall"
from = { x = 5.0, y = -10.0 }
to = { x = 5.0, y = 10.0 }

[[blockers]]
id = "airlock"
kind = "door"
from = { x = -5.0, y = -1.0 }
to = { x = -5.0, y = 1.0 }
closed = false
"#;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "janet-chat-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[derive(Default)]
    struct CountingSink {
        sent: Mutex<Vec<ConnectionId>>,
    }

    impl ConnectionSink for CountingSink {
        fn send(&self, connection: ConnectionId, _envelope: &ChatEnvelope<ChatUpdate>) {
            self.sent.lock().push(connection);
        }
    }

    // -----------------------------------------------------------------------
    // Scenario loading
    // -----------------------------------------------------------------------

    #[test]
    fn scenario_file_builds_world() {
        let path = write_temp("scenario.toml", SCENARIO);
        let scenario = Scenario::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let world = World::from_scenario(scenario).unwrap();
        assert_eq!(world.participant_count(), 3);
        assert_eq!(world.blocker_count(), 2);

        let alice = world.participant(&EntityId::new("alice")).unwrap();
        assert_eq!(
            alice.subscription_mask(false),
            ChannelSet::OOC | ChannelSet::LOCAL | ChannelSet::COMMON
        );
        let ghost = world.participant(&EntityId::new("ghost")).unwrap();
        assert!(ghost.is_observer());
        assert_eq!(
            ghost.subscription_mask(false),
            ChannelSet::OOC | ChannelSet::GHOST
        );
        assert!(world.participant(&EntityId::new("lobby")).unwrap().position().is_none());

        let in_region = world.recipients_in_region(RegionId(1)).unwrap();
        assert_eq!(in_region.len(), 1);
        assert!(world.recipients_in_region(RegionId(7)).is_none());
    }

    #[test]
    fn scenario_with_unknown_channel_is_rejected() {
        let scenario = Scenario {
            participants: vec![janet_chat::world::ParticipantSpec {
                id: "x".into(),
                connection: 1,
                region: None,
                position: Some(Vec2::zero()),
                observer: false,
                channels: "OOC, Telepathy".into(),
            }],
            ..Default::default()
        };
        assert!(matches!(
            World::from_scenario(scenario),
            Err(ChatError::Parse(_))
        ));
    }

    #[test]
    fn missing_scenario_file_is_a_config_error() {
        let path = std::env::temp_dir().join("janet-chat-does-not-exist.toml");
        assert!(matches!(Scenario::load(&path), Err(ChatError::Config(_))));
    }

    // -----------------------------------------------------------------------
    // Registry queries
    // -----------------------------------------------------------------------

    #[test]
    fn agents_in_radius_uses_euclidean_distance() {
        let path = write_temp("agents.toml", SCENARIO);
        let world = World::from_scenario(Scenario::load(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(world.agents_in_radius(Vec2::zero(), 14.0).len(), 1);
        assert!(world.agents_in_radius(Vec2::new(20.0, 20.0), 14.0).is_empty());
    }

    #[test]
    fn moving_a_participant_replaces_its_snapshot() {
        let world = World::new();
        let id = EntityId::new("alice");
        world.upsert_participant(
            Participant::new("alice", ConnectionId(1))
                .with_body(Body::new(Vec2::zero(), ChannelSet::LOCAL)),
        );

        let before = world.all_recipients();
        assert!(world.move_participant(&id, Vec2::new(50.0, 0.0)));

        assert_eq!(before[0].position(), Some(Vec2::zero()));
        assert_eq!(
            world.participant(&id).unwrap().position(),
            Some(Vec2::new(50.0, 0.0))
        );
    }

    #[test]
    fn removed_participant_leaves_later_snapshots_only() {
        let world = World::new();
        let id = EntityId::new("alice");
        world.upsert_participant(Participant::new("alice", ConnectionId(1)));

        let before = world.snapshot();
        let removed = world.remove_participant(&id).unwrap();

        assert_eq!(removed.connection, ConnectionId(1));
        assert!(world.all_recipients().is_empty());
        assert_eq!(before.all_recipients().len(), 1);
        assert!(world.remove_participant(&id).is_none());
    }

    #[test]
    fn bodiless_participant_cannot_move() {
        let world = World::new();
        world.upsert_participant(Participant::new("lobby", ConnectionId(1)));
        assert!(!world.move_participant(&EntityId::new("lobby"), Vec2::zero()));
        assert!(!world.move_participant(&EntityId::new("nobody"), Vec2::zero()));
    }

    #[test]
    fn only_doors_can_be_toggled() {
        let path = write_temp("doors.toml", SCENARIO);
        let world = World::from_scenario(Scenario::load(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(!world.occluded(Vec2::zero(), Vec2::new(-8.0, 0.0)));
        assert!(world.set_door_closed("airlock", true));
        assert!(world.occluded(Vec2::zero(), Vec2::new(-8.0, 0.0)));
        assert!(!world.set_door_closed("hall-wall", false));
        assert!(world.occluded(Vec2::zero(), Vec2::new(8.0, 0.0)));
    }

    // -----------------------------------------------------------------------
    // Feed
    // -----------------------------------------------------------------------

    #[test]
    fn feed_dispatches_valid_lines_and_skips_bad_ones() {
        let world = Arc::new(World::new());
        world.upsert_participant(
            Participant::new("alice", ConnectionId(1))
                .with_body(Body::new(Vec2::zero(), ChannelSet::OOC)),
        );
        let sink = Arc::new(CountingSink::default());
        let relay = ServerRelay::new(RelayConfig::default(), world, sink.clone());

        let event = ChatEvent::builder("Bob says, hi", ChannelSet::LOCAL)
            .origin(EventOrigin::at(1.0, 0.0))
            .build();
        let input = format!(
            "{}\n\nnot json\n{}\n",
            serde_json::to_string(&event).unwrap(),
            r#"{"text":"[OOC] Bob: lol","channels":1}"#
        );

        let summary = tokio_test::block_on(run_feed(input.as_bytes(), &relay)).unwrap();

        assert_eq!(summary.lines, 4);
        assert_eq!(summary.dispatched, 2);
        assert_eq!(summary.rejected, 1);
        assert_eq!(*sink.sent.lock(), vec![ConnectionId(1), ConnectionId(1)]);
        assert_eq!(relay.stats().dispatched, 2);
    }
}
