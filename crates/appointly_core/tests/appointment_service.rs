use appointly_core::db::open_db_in_memory;
use appointly_core::schedule::{InvalidInterval, WallClockParseError};
use appointly_core::{
    AppointmentService, AppointmentServiceError, CreateAppointmentRequest, CreateUserRequest,
    ScheduleError, SqliteAppointmentRepository, SqliteUserRepository, TimezoneScope, User,
    UserService, WorkingHoursValidator, WorkingWindow,
};
use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use uuid::Uuid;

type Service<'conn> =
    AppointmentService<SqliteUserRepository<'conn>, SqliteAppointmentRepository<'conn>>;

fn service(conn: &Connection, scope: TimezoneScope) -> Service<'_> {
    AppointmentService::new(
        SqliteUserRepository::try_new(conn).unwrap(),
        SqliteAppointmentRepository::try_new(conn).unwrap(),
        WorkingHoursValidator::new(WorkingWindow::default()),
        scope,
    )
}

fn add_user(conn: &Connection, username: &str, timezone: &str) -> User {
    UserService::new(SqliteUserRepository::try_new(conn).unwrap(), "Asia/Jakarta")
        .create_user(&CreateUserRequest {
            name: username.to_uppercase(),
            username: username.to_string(),
            preferred_timezone: Some(timezone.to_string()),
        })
        .unwrap()
}

fn request(start: &str, end: &str, participants: &[Uuid]) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        title: "Sprint planning".to_string(),
        start: start.to_string(),
        end: end.to_string(),
        participant_ids: participants.to_vec(),
    }
}

fn outside_hours_message(err: AppointmentServiceError) -> String {
    match err {
        AppointmentServiceError::Schedule(ScheduleError::OutsideWorkingHours(rejection)) => {
            rejection.to_string()
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn create_converts_creator_wall_clock_to_utc() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    let appointment = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00", "2024-01-15T10:30:00", &[]),
        )
        .unwrap();

    assert_eq!(appointment.start, Utc.with_ymd_and_hms(2024, 1, 15, 2, 0, 0).unwrap());
    assert_eq!(appointment.end, Utc.with_ymd_and_hms(2024, 1, 15, 3, 30, 0).unwrap());
    assert_eq!(appointment.participant_ids, vec![creator.id]);
    assert_eq!(appointment.title, "Sprint planning");
}

#[test]
fn create_ignores_offset_in_structured_input() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    let appointment = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00+05:00", "2024-01-15T10:00:00Z", &[]),
        )
        .unwrap();

    assert_eq!(appointment.start, Utc.with_ymd_and_hms(2024, 1, 15, 2, 0, 0).unwrap());
    assert_eq!(appointment.end, Utc.with_ymd_and_hms(2024, 1, 15, 3, 0, 0).unwrap());
}

#[test]
fn create_rejects_time_before_working_hours() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    let err = service
        .create(
            creator.id,
            &request("2024-01-15T08:00:00", "2024-01-15T09:00:00", &[]),
        )
        .unwrap_err();

    assert_eq!(
        outside_hours_message(err),
        "appointment time is outside working hours (09:00-17:00) for timezone(s): Asia/Jakarta (Asia/Jakarta: start=08:00, end=09:00)"
    );
    assert!(service.list_for(creator.id).unwrap().is_empty());
}

#[test]
fn closing_minute_of_the_window_is_accepted() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    service
        .create(
            creator.id,
            &request("2024-01-15T16:00:00", "2024-01-15T17:00:00", &[]),
        )
        .unwrap();

    let err = service
        .create(
            creator.id,
            &request("2024-01-15T16:00:00", "2024-01-15T17:01:00", &[]),
        )
        .unwrap_err();
    assert!(outside_hours_message(err).contains("end=17:01"));
}

#[test]
fn creator_scope_does_not_check_invitee_timezones() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let invitee = add_user(&conn, "alan", "Europe/London");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    // 02:00-03:00 in London.
    let appointment = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00", "2024-01-15T10:00:00", &[invitee.id]),
        )
        .unwrap();
    assert_eq!(appointment.participant_ids, vec![creator.id, invitee.id]);
}

#[test]
fn participant_scope_reports_failing_invitee_timezone() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let invitee = add_user(&conn, "alan", "Europe/London");
    let service = service(&conn, TimezoneScope::AllParticipants);

    let err = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00", "2024-01-15T10:00:00", &[invitee.id]),
        )
        .unwrap_err();

    assert_eq!(
        outside_hours_message(err),
        "appointment time is outside working hours (09:00-17:00) for timezone(s): Europe/London (Europe/London: start=02:00, end=03:00)"
    );
}

#[test]
fn participant_scope_adds_suffix_when_several_timezones_fail() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let invitee = add_user(&conn, "alan", "Europe/London");
    let service = service(&conn, TimezoneScope::AllParticipants);

    let err = service
        .create(
            creator.id,
            &request("2024-01-15T08:00:00", "2024-01-15T08:30:00", &[invitee.id]),
        )
        .unwrap_err();

    assert_eq!(
        outside_hours_message(err),
        "appointment time is outside working hours (09:00-17:00) for timezone(s): Asia/Jakarta (Asia/Jakarta: start=08:00, end=08:30). Please choose a time that works for all participants' timezones"
    );
}

#[test]
fn participant_scope_checks_each_timezone_once() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let colleague = add_user(&conn, "budi", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::AllParticipants);

    let err = service
        .create(
            creator.id,
            &request("2024-01-15T07:00:00", "2024-01-15T08:00:00", &[colleague.id]),
        )
        .unwrap_err();

    assert!(!outside_hours_message(err).contains("Please choose"));
}

#[test]
fn participant_scope_accepts_overlapping_working_hours() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let invitee = add_user(&conn, "alan", "Europe/London");
    let service = service(&conn, TimezoneScope::AllParticipants);

    // 16:00-17:00 Jakarta is 09:00-10:00 London.
    service
        .create(
            creator.id,
            &request("2024-01-15T16:00:00", "2024-01-15T17:00:00", &[invitee.id]),
        )
        .unwrap();
}

#[test]
fn local_wraparound_is_reported_as_invalid_interval() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let invitee = add_user(&conn, "grace", "America/New_York");
    let service = service(&conn, TimezoneScope::AllParticipants);

    // 21:00-05:00 in New York.
    let err = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00", "2024-01-15T17:00:00", &[invitee.id]),
        )
        .unwrap_err();

    match err {
        AppointmentServiceError::Schedule(ScheduleError::InvalidInterval(interval)) => {
            assert_eq!(interval, InvalidInterval::in_timezone("America/New_York"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn end_before_start_is_rejected_before_timezone_checks() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    let err = service
        .create(
            creator.id,
            &request("2024-01-15T10:00:00", "2024-01-15T10:00:00", &[]),
        )
        .unwrap_err();

    match err {
        AppointmentServiceError::Schedule(ScheduleError::InvalidInterval(interval)) => {
            assert_eq!(interval, InvalidInterval::global());
            assert_eq!(interval.to_string(), "end time must be after start time");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unparseable_times_are_reported_per_field() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    let err = service
        .create(creator.id, &request("15/01/2024 09:00", "2024-01-15T10:00:00", &[]))
        .unwrap_err();
    assert!(matches!(
        err,
        AppointmentServiceError::InvalidStart(WallClockParseError::Unrecognized { .. })
    ));

    let err = service
        .create(creator.id, &request("2024-01-15T09:00:00", "tomorrow", &[]))
        .unwrap_err();
    assert!(matches!(err, AppointmentServiceError::InvalidEnd(_)));
}

#[test]
fn unknown_creator_and_participants_are_rejected() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);
    let ghost = Uuid::new_v4();

    let err = service
        .create(ghost, &request("2024-01-15T09:00:00", "2024-01-15T10:00:00", &[]))
        .unwrap_err();
    assert!(matches!(err, AppointmentServiceError::CreatorNotFound(id) if id == ghost));

    let err = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00", "2024-01-15T10:00:00", &[ghost]),
        )
        .unwrap_err();
    assert!(matches!(err, AppointmentServiceError::ParticipantNotFound(id) if id == ghost));
}

#[test]
fn list_for_orders_by_start_and_projects_into_viewer_timezone() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let invitee = add_user(&conn, "alan", "Europe/London");
    let outsider = add_user(&conn, "zed", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    let later = service
        .create(
            creator.id,
            &request("2024-01-15T14:00:00", "2024-01-15T15:00:00", &[invitee.id]),
        )
        .unwrap();
    let earlier = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00", "2024-01-15T10:00:00", &[invitee.id]),
        )
        .unwrap();
    service
        .create(
            creator.id,
            &request("2024-01-16T09:00:00", "2024-01-16T10:00:00", &[]),
        )
        .unwrap();

    let views = service.list_for(invitee.id).unwrap();
    let ids = views.iter().map(|view| view.id).collect::<Vec<_>>();
    assert_eq!(ids, vec![earlier.id, later.id]);
    assert_eq!(views[0].start_local, "2024-01-15 02:00:00");
    assert_eq!(views[0].end_local, "2024-01-15 03:00:00");
    assert_eq!(views[0].creator.id, creator.id);
    let participants = views[0]
        .participants
        .iter()
        .map(|summary| summary.id)
        .collect::<Vec<_>>();
    assert_eq!(participants, vec![creator.id, invitee.id]);

    let creator_views = service.list_for(creator.id).unwrap();
    assert_eq!(creator_views.len(), 3);
    assert_eq!(creator_views[0].start_local, "2024-01-15 09:00:00");

    assert!(service.list_for(outsider.id).unwrap().is_empty());
}

#[test]
fn get_is_limited_to_creator_and_participants() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let invitee = add_user(&conn, "alan", "Europe/London");
    let outsider = add_user(&conn, "zed", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    let appointment = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00", "2024-01-15T10:00:00", &[invitee.id]),
        )
        .unwrap();

    let view = service.get(invitee.id, appointment.id).unwrap();
    assert_eq!(view.title, "Sprint planning");
    assert_eq!(view.start_local, "2024-01-15 02:00:00");
    assert_eq!(
        service.get(creator.id, appointment.id).unwrap().start_local,
        "2024-01-15 09:00:00"
    );

    let err = service.get(outsider.id, appointment.id).unwrap_err();
    assert!(matches!(err, AppointmentServiceError::NotParticipant(id) if id == appointment.id));

    let missing = Uuid::new_v4();
    let err = service.get(creator.id, missing).unwrap_err();
    assert!(matches!(err, AppointmentServiceError::AppointmentNotFound(id) if id == missing));

    let ghost = Uuid::new_v4();
    let err = service.get(ghost, appointment.id).unwrap_err();
    assert!(matches!(err, AppointmentServiceError::UserNotFound(id) if id == ghost));
}

#[test]
fn delete_is_limited_to_creator() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let invitee = add_user(&conn, "alan", "Europe/London");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    let appointment = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00", "2024-01-15T10:00:00", &[invitee.id]),
        )
        .unwrap();

    let err = service.delete(invitee.id, appointment.id).unwrap_err();
    assert!(matches!(err, AppointmentServiceError::NotCreator(id) if id == appointment.id));
    assert_eq!(service.list_for(invitee.id).unwrap().len(), 1);

    service.delete(creator.id, appointment.id).unwrap();
    assert!(service.list_for(invitee.id).unwrap().is_empty());
    assert!(matches!(
        service.get(creator.id, appointment.id).unwrap_err(),
        AppointmentServiceError::AppointmentNotFound(_)
    ));
    assert!(matches!(
        service.delete(creator.id, appointment.id).unwrap_err(),
        AppointmentServiceError::AppointmentNotFound(_)
    ));
}

#[test]
fn custom_window_changes_the_rejection_text() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let service = AppointmentService::new(
        SqliteUserRepository::try_new(&conn).unwrap(),
        SqliteAppointmentRepository::try_new(&conn).unwrap(),
        WorkingHoursValidator::new(WorkingWindow::from_hours(8, 12).unwrap()),
        TimezoneScope::CreatorOnly,
    );

    service
        .create(
            creator.id,
            &request("2024-01-15T08:00:00", "2024-01-15T09:00:00", &[]),
        )
        .unwrap();
    let err = service
        .create(
            creator.id,
            &request("2024-01-15T13:00:00", "2024-01-15T14:00:00", &[]),
        )
        .unwrap_err();
    assert!(outside_hours_message(err).contains("(08:00-12:00)"));
}

#[test]
fn view_serializes_instants_as_rfc3339() {
    let conn = open_db_in_memory().unwrap();
    let creator = add_user(&conn, "ada", "Asia/Jakarta");
    let service = service(&conn, TimezoneScope::CreatorOnly);

    let appointment = service
        .create(
            creator.id,
            &request("2024-01-15T09:00:00", "2024-01-15T10:00:00", &[]),
        )
        .unwrap();
    let view = service.get(creator.id, appointment.id).unwrap();

    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["start"], "2024-01-15T02:00:00Z");
    assert_eq!(json["start_local"], "2024-01-15 09:00:00");
    assert_eq!(json["creator"]["username"], "ada");
}
