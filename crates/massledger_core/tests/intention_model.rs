use chrono::NaiveDate;
use massledger_core::{
    BulkState, DailyRecord, FixedDateState, FulfillmentEvent, Intention, IntentionKind,
    IntentionKindTag, IntentionValidationError, PeriodicState,
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn intention_new_sets_defaults() {
    let celebrant = Uuid::new_v4();
    let intention = Intention::new(
        celebrant,
        "For the souls in purgatory",
        IntentionKind::Bulk(BulkState::new(30, date(2024, 11, 2))),
    );

    assert!(!intention.id.is_nil());
    assert_eq!(intention.celebrant, celebrant);
    assert_eq!(intention.kind_tag(), IntentionKindTag::Bulk);
    assert_eq!(intention.description, None);
    assert_eq!(intention.source, None);
    assert_eq!(intention.created_at, intention.updated_at);
    assert!(!intention.kind.is_complete());
    assert!(intention.validate().is_ok());
}

#[test]
fn bulk_serialization_uses_flat_kind_tag() {
    let mut intention = Intention::new(
        Uuid::new_v4(),
        "Gregorian masses",
        IntentionKind::Bulk(BulkState::new(30, date(2024, 1, 15))),
    );
    intention.source = Some("Kowalski family".to_string());

    let json = serde_json::to_value(&intention).unwrap();
    assert_eq!(json["id"], intention.id.to_string());
    assert_eq!(json["kind"], "bulk");
    assert_eq!(json["total"], 30);
    assert_eq!(json["remaining"], 30);
    assert_eq!(json["start_date"], "2024-01-15");
    assert_eq!(json["paused"], false);
    assert_eq!(json["source"], "Kowalski family");

    let decoded: Intention = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, intention);
}

#[test]
fn fixed_date_serialization_keeps_original_and_reschedule() {
    let intention = Intention::new(
        Uuid::new_v4(),
        "Wedding anniversary",
        IntentionKind::FixedDate(FixedDateState {
            original_date: date(2024, 6, 1),
            rescheduled_date: Some(date(2024, 6, 3)),
            reschedule_reason: Some("parish retreat".to_string()),
            fulfilled: false,
        }),
    );

    let json = serde_json::to_value(&intention).unwrap();
    assert_eq!(json["kind"], "fixed_date");
    assert_eq!(json["original_date"], "2024-06-01");
    assert_eq!(json["rescheduled_date"], "2024-06-03");
    assert_eq!(json["reschedule_reason"], "parish retreat");
}

#[test]
fn validate_rejects_remaining_above_total() {
    let mut state = BulkState::new(5, date(2024, 1, 1));
    state.remaining = 6;
    let intention = Intention::new(Uuid::new_v4(), "novena", IntentionKind::Bulk(state));

    assert_eq!(
        intention.validate(),
        Err(IntentionValidationError::RemainingExceedsTotal {
            remaining: 6,
            total: 5
        })
    );
}

#[test]
fn validate_rejects_reason_without_reschedule_date() {
    let intention = Intention::new(
        Uuid::new_v4(),
        "funeral",
        IntentionKind::FixedDate(FixedDateState {
            original_date: date(2024, 6, 1),
            rescheduled_date: None,
            reschedule_reason: Some("snow".to_string()),
            fulfilled: false,
        }),
    );

    assert_eq!(
        intention.validate(),
        Err(IntentionValidationError::RescheduleReasonWithoutDate)
    );
}

#[test]
fn validate_rejects_nil_celebrant() {
    let intention = Intention::new(
        Uuid::nil(),
        "monthly",
        IntentionKind::Periodic(PeriodicState {
            month: 1,
            year: 2024,
            fulfilled_on: None,
        }),
    );
    assert_eq!(intention.validate(), Err(IntentionValidationError::NilCelebrant));
}

#[test]
fn kind_tag_parse_matches_as_str() {
    for tag in [
        IntentionKindTag::Periodic,
        IntentionKindTag::FixedDate,
        IntentionKindTag::Bulk,
    ] {
        assert_eq!(IntentionKindTag::parse(tag.as_str()), Some(tag));
    }
    assert_eq!(IntentionKindTag::parse("personal"), None);
}

#[test]
fn daily_record_constructors_set_met_flag_and_reason() {
    let celebrant = Uuid::new_v4();
    let met = DailyRecord::met(celebrant, date(2024, 2, 1));
    assert!(met.met);
    assert_eq!(met.reason, None);

    let missed = DailyRecord::not_met(celebrant, date(2024, 2, 2), "illness");
    assert!(!missed.met);
    assert_eq!(missed.reason.as_deref(), Some("illness"));
}

#[test]
fn fulfillment_event_keeps_notes_verbatim() {
    let event = FulfillmentEvent::new(Uuid::new_v4(), Uuid::new_v4(), date(2024, 2, 1), "");
    assert!(event.notes.is_empty());
    assert!(!event.id.is_nil());
}
