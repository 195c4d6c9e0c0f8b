use crate::config::ChatConfig;
use crate::core_chat::ChatError;
use crate::core_events::ChatEvent;
use crate::core_model::{
    Body, ChatId, DeliveryReceipt, DeliveryReceiptType, Invitation, Presence, PresenceType,
    Sendable, SendableType, TypingState, TypingStateType, UserId,
};
use crate::test_utils::*;
use proptest::prelude::*;

fn bob() -> UserId {
    UserId::new(BOB)
}

#[tokio::test]
async fn test_message_typing_message_scenario() {
    let fx = ChatFixture::one_to_one();
    let mut raw = fx.chat.events().subscribe_sendables();
    let mut messages = fx.chat.events().subscribe_messages();
    let mut typing = fx.chat.events().subscribe_typing_states();
    fx.chat.connect().await.unwrap();

    let first = fx.deliver_text(BOB, "one");
    let indicator = fx.deliver(TypingState::create(bob(), TypingStateType::Typing));
    let third = fx.deliver_text(BOB, "two");

    let seen = collect_n(&mut raw, 3, DEFAULT_TEST_TIMEOUT).await.unwrap();
    assert_eq!(seen, vec![first.clone(), indicator.clone(), third.clone()]);

    let typed = collect_n(&mut messages, 2, DEFAULT_TEST_TIMEOUT).await.unwrap();
    assert_eq!(typed[0].id(), &first.id);
    assert_eq!(typed[1].id(), &third.id);
    assert_eq!(typed[1].text(), Some("two"));

    let state = recv_timeout(&mut typing, DEFAULT_TEST_TIMEOUT).await.unwrap();
    assert_eq!(state.id(), &indicator.id);
    assert_eq!(state.typing_state(), Some(TypingStateType::Typing));

    assert_no_event(&mut messages, SHORT_TEST_TIMEOUT).await;
    assert_no_event(&mut typing, SHORT_TEST_TIMEOUT).await;
}

#[tokio::test]
async fn test_each_kind_reaches_exactly_its_channel() {
    let fx = ChatFixture::one_to_one();
    let events = fx.chat.events();
    let mut raw = events.subscribe_sendables();
    let mut messages = events.subscribe_messages();
    let mut receipts = events.subscribe_delivery_receipts();
    let mut typing = events.subscribe_typing_states();
    let mut invitations = events.subscribe_invitations();
    let mut presences = events.subscribe_presences();
    fx.chat.connect().await.unwrap();

    let msg = fx.deliver_text(BOB, "hi");
    fx.deliver(DeliveryReceipt::create(bob(), DeliveryReceiptType::Read, &msg.id));
    fx.deliver(TypingState::create(bob(), TypingStateType::None));
    fx.deliver(Invitation::create(bob(), &ChatId::new("c1")));
    fx.deliver(Presence::create(bob(), PresenceType::Busy));

    assert_eq!(collect_n(&mut raw, 5, DEFAULT_TEST_TIMEOUT).await.unwrap().len(), 5);
    assert!(recv_timeout(&mut messages, DEFAULT_TEST_TIMEOUT).await.is_ok());
    let receipt = recv_timeout(&mut receipts, DEFAULT_TEST_TIMEOUT).await.unwrap();
    assert_eq!(receipt.message_id(), Some(msg.id.clone()));
    assert!(recv_timeout(&mut typing, DEFAULT_TEST_TIMEOUT).await.is_ok());
    let invitation = recv_timeout(&mut invitations, DEFAULT_TEST_TIMEOUT).await.unwrap();
    assert_eq!(invitation.chat_id(), Some(ChatId::new("c1")));
    let presence = recv_timeout(&mut presences, DEFAULT_TEST_TIMEOUT).await.unwrap();
    assert_eq!(presence.presence_type(), Some(PresenceType::Busy));

    assert_no_event(&mut messages, SHORT_TEST_TIMEOUT).await;
    assert_no_event(&mut receipts, SHORT_TEST_TIMEOUT).await;
    assert_no_event(&mut typing, SHORT_TEST_TIMEOUT).await;
    assert_no_event(&mut invitations, SHORT_TEST_TIMEOUT).await;
    assert_no_event(&mut presences, SHORT_TEST_TIMEOUT).await;
}

#[tokio::test]
async fn test_unknown_kind_goes_to_raw_only_and_is_logged() {
    let fx = ChatFixture::one_to_one();
    let mut raw = fx.chat.events().subscribe_sendables();
    let mut all = fx.chat.events().subscribe_all();
    let mut errors = fx.chat.events().subscribe_errors();
    fx.chat.connect().await.unwrap();

    let poll = fx.deliver(Sendable::new(SendableType::parse("poll"), bob(), Body::new()));

    assert_eq!(recv_timeout(&mut raw, DEFAULT_TEST_TIMEOUT).await.unwrap(), poll);
    assert_no_event(&mut all, SHORT_TEST_TIMEOUT).await;
    assert_no_event(&mut errors, SHORT_TEST_TIMEOUT).await;
    assert_eq!(fx.chat.get_sendables(), vec![poll]);
}

#[tokio::test]
async fn test_classification_gap_reported_when_configured() {
    let config = ChatConfig { report_classification_gaps: true, ..ChatConfig::default() };
    let fx = ChatFixture::one_to_one_with_config(config);
    let mut errors = fx.chat.events().subscribe_errors();
    let mut all = fx.chat.events().subscribe_all();
    fx.chat.connect().await.unwrap();

    let poll = fx.deliver(Sendable::new(SendableType::parse("poll"), bob(), Body::new()));

    let expected = ChatError::ClassificationGap { id: poll.id.clone(), kind: poll.kind().clone() };
    assert_eq!(recv_timeout(&mut errors, DEFAULT_TEST_TIMEOUT).await.unwrap(), expected);
    assert_eq!(
        recv_timeout(&mut all, DEFAULT_TEST_TIMEOUT).await.unwrap(),
        ChatEvent::Error(expected)
    );
}

#[tokio::test]
async fn test_merged_channel_preserves_arrival_order() {
    let fx = ChatFixture::one_to_one();
    let mut all = fx.chat.events().subscribe_all();
    fx.chat.connect().await.unwrap();

    fx.deliver_text(BOB, "a");
    fx.deliver(Presence::create(bob(), PresenceType::Available));
    fx.deliver_text(BOB, "b");

    let seen = collect_n(&mut all, 3, DEFAULT_TEST_TIMEOUT).await.unwrap();
    assert!(matches!(seen[0], ChatEvent::Message(_)));
    assert!(matches!(seen[1], ChatEvent::Presence(_)));
    assert!(matches!(seen[2], ChatEvent::Message(_)));
}

#[tokio::test]
async fn test_get_sendables_of_filters_in_arrival_order() {
    let fx = ChatFixture::one_to_one();
    let mut raw = fx.chat.events().subscribe_sendables();
    fx.chat.connect().await.unwrap();

    let a = fx.deliver_text(BOB, "a");
    let t = fx.deliver(TypingState::create(bob(), TypingStateType::Typing));
    let b = fx.deliver_text(BOB, "b");
    collect_n(&mut raw, 3, DEFAULT_TEST_TIMEOUT).await.unwrap();

    assert_eq!(fx.chat.get_sendables(), vec![a.clone(), t.clone(), b.clone()]);
    assert_eq!(fx.chat.get_sendables_of(&SendableType::Message), vec![a, b]);
    assert_eq!(fx.chat.get_sendables_of(&SendableType::TypingState), vec![t]);
    assert!(fx.chat.get_sendables_of(&SendableType::Presence).is_empty());
}

fn any_kind() -> impl Strategy<Value = SendableType> {
    prop_oneof![
        Just(SendableType::Message),
        Just(SendableType::DeliveryReceipt),
        Just(SendableType::TypingState),
        Just(SendableType::Invitation),
        Just(SendableType::Presence),
        "[a-z]{3,8}".prop_map(|s| SendableType::parse(&s)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_log_filter_matches_kind_subset(kinds in proptest::collection::vec(any_kind(), 0..12)) {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (log, delivered, filtered) = runtime.block_on(async {
            let fx = ChatFixture::one_to_one();
            let mut raw = fx.chat.events().subscribe_sendables();
            fx.chat.connect().await.unwrap();

            let delivered: Vec<Sendable> = kinds
                .iter()
                .map(|kind| fx.deliver(Sendable::new(kind.clone(), bob(), Body::new())))
                .collect();
            collect_n(&mut raw, delivered.len(), DEFAULT_TEST_TIMEOUT).await.unwrap();

            let filtered: Vec<Vec<Sendable>> =
                kinds.iter().map(|kind| fx.chat.get_sendables_of(kind)).collect();
            (fx.chat.get_sendables(), delivered, filtered)
        });

        prop_assert_eq!(&log, &delivered);
        for (kind, got) in kinds.iter().zip(filtered) {
            let expected: Vec<Sendable> =
                delivered.iter().filter(|s| s.kind() == kind).cloned().collect();
            prop_assert_eq!(got, expected);
        }
    }
}
