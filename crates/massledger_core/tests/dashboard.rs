use chrono::NaiveDate;
use massledger_core::db::open_db_in_memory;
use massledger_core::{
    DashboardAlert, DashboardService, FixedClock, FulfillmentRequest, LifecycleService,
    NewIntention, SqliteObligationStore, SqliteRecords,
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn snapshot_reports_counts_projections_and_alerts() {
    let mut conn = open_db_in_memory().unwrap();
    let celebrant = Uuid::new_v4();
    let today = date(2024, 6, 10);

    {
        let mut service = LifecycleService::with_clock(
            SqliteObligationStore::try_new(&mut conn).unwrap(),
            FixedClock(today),
        );
        let periodic = service
            .create_periodic(celebrant, NewIntention::titled("June 1"), 6, 2024)
            .unwrap();
        service
            .create_periodic(celebrant, NewIntention::titled("June 2"), 6, 2024)
            .unwrap();
        service
            .record_fulfillment(celebrant, periodic.id, FulfillmentRequest::on(date(2024, 6, 3)))
            .unwrap();

        // Created after the periodic fulfillment so it stays unpaused.
        service
            .create_bulk(celebrant, NewIntention::titled("Novena"), 9, Some(date(2024, 6, 1)))
            .unwrap();
        service
            .create_fixed_date(celebrant, NewIntention::titled("Anniversary"), today)
            .unwrap();
        service
            .create_fixed_date(celebrant, NewIntention::titled("Funeral"), date(2024, 6, 11))
            .unwrap();
    }

    let records = SqliteRecords::try_new(&conn).unwrap();
    let dashboard = DashboardService::with_clock(records, FixedClock(today));
    let view = dashboard.snapshot(celebrant, None).unwrap();

    assert_eq!(view.as_of, today);
    assert_eq!(view.today_status, None);
    assert_eq!(view.periodic_fulfilled_count, 1);
    assert_eq!(view.periodic_details.len(), 2);
    assert_eq!(view.active_bulk.len(), 1);
    assert_eq!(view.active_bulk[0].estimated_end_date, Some(date(2024, 6, 19)));
    assert_eq!(view.upcoming_fixed_date.len(), 2);
    assert_eq!(
        view.alerts,
        vec![
            DashboardAlert::PeriodicPending { pending: 2 },
            DashboardAlert::BulkNearlyComplete {
                title: "Novena".to_string(),
                remaining: 9
            },
            DashboardAlert::FixedDateToday {
                title: "Anniversary".to_string()
            },
            DashboardAlert::FixedDateTomorrow {
                title: "Funeral".to_string()
            },
        ]
    );
}

#[test]
fn snapshot_reflects_today_status_and_paused_bulk() {
    let mut conn = open_db_in_memory().unwrap();
    let celebrant = Uuid::new_v4();
    let today = date(2024, 7, 20);

    {
        let mut service = LifecycleService::with_clock(
            SqliteObligationStore::try_new(&mut conn).unwrap(),
            FixedClock(today),
        );
        service
            .create_bulk(celebrant, NewIntention::titled("Gregorian"), 30, None)
            .unwrap();
        let fixed = service
            .create_fixed_date(celebrant, NewIntention::titled("Wedding"), today)
            .unwrap();
        service
            .record_fulfillment(celebrant, fixed.id, FulfillmentRequest::default())
            .unwrap();
    }

    let dashboard =
        DashboardService::with_clock(SqliteRecords::try_new(&conn).unwrap(), FixedClock(today));
    let view = dashboard.snapshot(celebrant, None).unwrap();

    assert!(view.today_status.as_ref().unwrap().met);
    assert_eq!(view.active_bulk.len(), 1);
    assert!(view.active_bulk[0].intention.as_bulk().unwrap().paused);
    assert_eq!(view.active_bulk[0].estimated_end_date, None);
    assert!(view.upcoming_fixed_date.is_empty());
    assert_eq!(
        view.alert_messages(),
        vec!["You have 3 personal masses pending for this month.".to_string()]
    );
}

#[test]
fn snapshot_for_explicit_date_ignores_other_months() {
    let mut conn = open_db_in_memory().unwrap();
    let celebrant = Uuid::new_v4();

    {
        let mut service = LifecycleService::with_clock(
            SqliteObligationStore::try_new(&mut conn).unwrap(),
            FixedClock(date(2024, 1, 1)),
        );
        for month in [1, 2] {
            let periodic = service
                .create_periodic(celebrant, NewIntention::titled("monthly"), month, 2024)
                .unwrap();
            service
                .record_fulfillment(
                    celebrant,
                    periodic.id,
                    FulfillmentRequest::on(date(2024, month, 5)),
                )
                .unwrap();
        }
    }

    let dashboard = DashboardService::new(SqliteRecords::try_new(&conn).unwrap());
    let view = dashboard.snapshot(celebrant, Some(date(2024, 2, 28))).unwrap();
    assert_eq!(view.periodic_details.len(), 1);
    assert_eq!(view.periodic_fulfilled_count, 1);
    assert!(matches!(
        view.alerts.first(),
        Some(DashboardAlert::PeriodicPending { pending: 2 })
    ));
}

#[test]
fn empty_celebrant_gets_only_threshold_alert() {
    let conn = open_db_in_memory().unwrap();
    let dashboard = DashboardService::with_clock(
        SqliteRecords::try_new(&conn).unwrap(),
        FixedClock(date(2024, 12, 24)),
    );

    let view = dashboard.snapshot(Uuid::new_v4(), None).unwrap();
    assert_eq!(view.periodic_fulfilled_count, 0);
    assert!(view.active_bulk.is_empty());
    assert_eq!(view.alerts, vec![DashboardAlert::PeriodicPending { pending: 3 }]);

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["as_of"], "2024-12-24");
    assert_eq!(json["alerts"][0]["kind"], "periodic_pending");
}
