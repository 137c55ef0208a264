mod common;

use api::gql::domains::groups::service::{self, TransferParams};
use api::gql::error::LeagueError;
use api::AppState;
use async_graphql::Variables;
use chrono::{Duration, Utc};
use common::*;
use futures_util::future::join_all;
use infra::models::GROUP_CAPACITY;
use infra::repos::{group_memberships, league_groups, user_season_points, users, CreateLeagueGroup};
use serde_json::json;
use uuid::Uuid;

async fn seat(app_state: &AppState, season_id: &str, user_id: Uuid, league: i32) -> Uuid {
    service::assign_user_to_group(
        &app_state.db,
        app_state.league(),
        user_id,
        league,
        season_id.to_string(),
    )
    .await
    .expect("assignment should succeed")
}

/// Credit points to both the ledger and the membership mirror.
async fn credit(app_state: &AppState, season_id: &str, user_id: Uuid, group_id: Uuid, points: f64) {
    let now = Utc::now();
    user_season_points::add_points(&app_state.db, season_id, user_id, points, now)
        .await
        .unwrap();
    group_memberships::add_points(&app_state.db, group_id, user_id, points, now)
        .await
        .unwrap();
}

async fn backend_pid(conn: &mut sqlx::PgConnection) -> i32 {
    sqlx::query_scalar("SELECT pg_backend_pid()")
        .fetch_one(conn)
        .await
        .unwrap()
}

const ASSIGN: &str = r#"
    mutation Assign($userId: UUID, $leagueNumber: Int, $seasonId: String) {
        assignUserToGroup(userId: $userId, leagueNumber: $leagueNumber, seasonId: $seasonId) {
            success
            groupId
        }
    }
"#;

#[tokio::test]
async fn test_twenty_first_user_opens_second_group() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let season_id = create_test_season(&app_state).await;

    let mut assigned = Vec::new();
    for _ in 0..21 {
        let user_id = create_test_user(&app_state, 1, Vec::new()).await;
        let group_id = service::assign_user_to_group(
            &app_state.db,
            app_state.league(),
            user_id,
            1,
            season_id.clone(),
        )
        .await
        .expect("assignment should succeed");
        assigned.push(group_id);
    }

    let groups = league_groups::list_by_season_league(&app_state.db, &season_id, 1)
        .await
        .unwrap();
    assert_eq!(groups.len(), 2);

    let first = &groups[0];
    let second = &groups[1];
    assert_eq!(first.current_count, 20);
    assert!(first.is_full);
    assert_eq!(second.current_count, 1);
    assert!(!second.is_full);

    assert!(assigned[..20].iter().all(|group_id| *group_id == first.id));
    assert_eq!(assigned[20], second.id);
}

#[tokio::test]
async fn test_assignment_through_graphql_is_idempotent() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let schema = schema_for(&app_state);
    let season_id = create_test_season(&app_state).await;
    let user_id = create_test_user(&app_state, 4, Vec::new()).await;

    let variables = json!({
        "userId": user_id,
        "leagueNumber": 4,
        "seasonId": season_id
    });

    let first = execute_graphql(
        &schema,
        ASSIGN,
        Some(Variables::from_json(variables.clone())),
        Some(admin_claims()),
    )
    .await;
    let second = execute_graphql(
        &schema,
        ASSIGN,
        Some(Variables::from_json(variables)),
        Some(admin_claims()),
    )
    .await;

    assert!(first.errors.is_empty(), "{:?}", first.errors);
    assert!(second.errors.is_empty(), "{:?}", second.errors);

    let first = first.data.into_json().unwrap();
    let second = second.data.into_json().unwrap();
    assert_eq!(first["assignUserToGroup"]["success"], true);
    assert_eq!(
        first["assignUserToGroup"]["groupId"],
        second["assignUserToGroup"]["groupId"]
    );

    let group_id: Uuid = first["assignUserToGroup"]["groupId"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let group = league_groups::get_by_id(&app_state.db, group_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(group.current_count, 1);
}

#[tokio::test]
async fn test_assignment_to_unknown_season_or_user() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let schema = schema_for(&app_state);
    let user_id = create_test_user(&app_state, 2, Vec::new()).await;

    let unknown_season = execute_graphql(
        &schema,
        ASSIGN,
        Some(Variables::from_json(json!({
            "userId": user_id,
            "leagueNumber": 2,
            "seasonId": format!("missing-{}", Uuid::new_v4())
        }))),
        Some(admin_claims()),
    )
    .await;
    assert_eq!(first_error_code(&unknown_season).as_deref(), Some("NOT_FOUND"));

    let season_id = create_test_season(&app_state).await;
    let unknown_user = execute_graphql(
        &schema,
        ASSIGN,
        Some(Variables::from_json(json!({
            "userId": Uuid::new_v4(),
            "leagueNumber": 2,
            "seasonId": season_id
        }))),
        Some(admin_claims()),
    )
    .await;
    assert_eq!(
        first_error_code(&unknown_user).as_deref(),
        Some("USER_NOT_FOUND")
    );
}

#[tokio::test]
async fn test_concurrent_assignments_never_overfill_a_group() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let season_id = create_test_season(&app_state).await;

    let mut user_ids = Vec::new();
    for _ in 0..30 {
        user_ids.push(create_test_user(&app_state, 6, Vec::new()).await);
    }

    let results = join_all(user_ids.iter().map(|user_id| {
        let state = app_state.clone();
        let season_id = season_id.clone();
        let user_id = *user_id;
        async move {
            service::assign_user_to_group(&state.db, state.league(), user_id, 6, season_id).await
        }
    }))
    .await;

    for result in &results {
        assert!(result.is_ok(), "assignment failed: {result:?}");
    }

    let groups = league_groups::list_by_season_league(&app_state.db, &season_id, 6)
        .await
        .unwrap();
    let mut seated = 0;
    for group in &groups {
        let members = group_memberships::count_in_group(&app_state.db, group.id)
            .await
            .unwrap();
        assert!(group.current_count <= group.capacity);
        assert_eq!(i64::from(group.current_count), members);
        assert_eq!(group.is_full, group.current_count == group.capacity);
        seated += members;
    }
    assert_eq!(seated, 30);
}

#[tokio::test]
async fn test_league_change_moves_the_seat() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let schema = schema_for(&app_state);
    let season_id = create_test_season(&app_state).await;
    let user_id = create_test_user(&app_state, 3, Vec::new()).await;

    let old_group_id = seat(&app_state, &season_id, user_id, 3).await;
    credit(&app_state, &season_id, user_id, old_group_id, 12.5).await;

    let query = r#"
        mutation UpdateLeague($userId: UUID, $newLeague: Int, $seasonId: String) {
            updateUserLeague(userId: $userId, newLeague: $newLeague, seasonId: $seasonId) {
                success
                league
                groupId
            }
        }
    "#;
    let response = execute_graphql(
        &schema,
        query,
        Some(Variables::from_json(json!({
            "userId": user_id,
            "newLeague": 4,
            "seasonId": season_id
        }))),
        Some(player_claims(user_id)),
    )
    .await;

    assert!(response.errors.is_empty(), "{:?}", response.errors);
    let data = response.data.into_json().unwrap();
    assert_eq!(data["updateUserLeague"]["league"], 4);

    let new_group_id: Uuid = data["updateUserLeague"]["groupId"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    assert_ne!(new_group_id, old_group_id);

    let old_group = league_groups::get_by_id(&app_state.db, old_group_id)
        .await
        .unwrap()
        .unwrap();
    let new_group = league_groups::get_by_id(&app_state.db, new_group_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old_group.current_count, 0);
    assert_eq!(new_group.current_count, 1);
    assert_eq!(new_group.league_number, 4);

    assert_eq!(
        group_memberships::count_in_group(&app_state.db, old_group_id)
            .await
            .unwrap(),
        0
    );
    let membership = group_memberships::get_for_user_in_season(&app_state.db, &season_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.group_id, new_group_id);
    assert_eq!(membership.points, 12.5);

    let ledger = user_season_points::get(&app_state.db, &season_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.group_id, Some(new_group_id));
    assert_eq!(ledger.league, 4);
    assert_eq!(ledger.points, 12.5);

    let profile = users::get_by_id(&app_state.db, user_id).await.unwrap().unwrap();
    assert_eq!(profile.league, 4);
    assert_eq!(profile.current_group_id, Some(new_group_id));
}

#[tokio::test]
async fn test_same_league_change_is_a_no_op() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let season_id = create_test_season(&app_state).await;
    let user_id = create_test_user(&app_state, 5, Vec::new()).await;

    let group_id = service::assign_user_to_group(
        &app_state.db,
        app_state.league(),
        user_id,
        5,
        season_id.clone(),
    )
    .await
    .unwrap();

    let change = service::update_user_league(
        &app_state.db,
        app_state.league(),
        user_id,
        5,
        Some(season_id.clone()),
        chrono::Utc::now(),
    )
    .await
    .unwrap();

    assert_eq!(change.league, 5);
    assert_eq!(change.group_id, Some(group_id));

    let groups = league_groups::list_by_season_league(&app_state.db, &season_id, 5)
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].current_count, 1);
}

#[tokio::test]
async fn test_reconcile_repairs_drifted_counter() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let season_id = create_test_season(&app_state).await;
    let user_id = create_test_user(&app_state, 8, Vec::new()).await;

    let group_id = service::assign_user_to_group(
        &app_state.db,
        app_state.league(),
        user_id,
        8,
        season_id.clone(),
    )
    .await
    .unwrap();
    league_groups::set_occupancy(&app_state.db, group_id, 7, false)
        .await
        .unwrap();

    let report = service::reconcile_season(&app_state.db, &season_id)
        .await
        .unwrap();
    assert!(report.groups_repaired >= 1);

    let group = league_groups::get_by_id(&app_state.db, group_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(group.current_count, 1);
    assert!(!group.is_full);
}

#[tokio::test]
async fn test_group_info_reports_occupancy() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let schema = schema_for(&app_state);
    let season_id = create_test_season(&app_state).await;
    let user_id = create_test_user(&app_state, 14, Vec::new()).await;

    let group_id = service::assign_user_to_group(
        &app_state.db,
        app_state.league(),
        user_id,
        14,
        season_id.clone(),
    )
    .await
    .unwrap();

    let query = r#"
        query Group($groupId: UUID!) {
            groupInfo(groupId: $groupId) {
                id
                seasonId
                leagueNumber
                capacity
                currentCount
                isFull
            }
        }
    "#;

    let response = execute_graphql(
        &schema,
        query,
        Some(Variables::from_json(json!({ "groupId": group_id }))),
        None,
    )
    .await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let data = response.data.into_json().unwrap();
    let group = &data["groupInfo"];
    assert_eq!(group["id"], group_id.to_string());
    assert_eq!(group["seasonId"], season_id.as_str());
    assert_eq!(group["leagueNumber"], 14);
    assert_eq!(group["capacity"], 20);
    assert_eq!(group["currentCount"], 1);
    assert_eq!(group["isFull"], false);

    let missing = execute_graphql(
        &schema,
        query,
        Some(Variables::from_json(json!({ "groupId": Uuid::new_v4() }))),
        None,
    )
    .await;
    assert!(missing.errors.is_empty(), "{:?}", missing.errors);
    assert!(missing.data.into_json().unwrap()["groupInfo"].is_null());
}

#[tokio::test]
async fn test_reassign_into_other_league_moves_the_seat() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let season_id = create_test_season(&app_state).await;
    let user_id = create_test_user(&app_state, 4, Vec::new()).await;

    let first_group_id = seat(&app_state, &season_id, user_id, 4).await;
    credit(&app_state, &season_id, user_id, first_group_id, 6.0).await;

    let moved_group_id = seat(&app_state, &season_id, user_id, 9).await;
    assert_ne!(moved_group_id, first_group_id);

    let moved = league_groups::get_by_id(&app_state.db, moved_group_id)
        .await
        .unwrap()
        .unwrap();
    let first = league_groups::get_by_id(&app_state.db, first_group_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.league_number, 9);
    assert_eq!(moved.current_count, 1);
    assert_eq!(first.current_count, 0);

    let membership = group_memberships::get_for_user_in_season(&app_state.db, &season_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.group_id, moved_group_id);
    assert_eq!(membership.points, 6.0);

    let ledger = user_season_points::get(&app_state.db, &season_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.league, 9);
    assert_eq!(ledger.group_id, Some(moved_group_id));

    let profile = users::get_by_id(&app_state.db, user_id).await.unwrap().unwrap();
    assert_eq!(profile.league, 9);
    assert_eq!(profile.current_group_id, Some(moved_group_id));
}

#[tokio::test]
async fn test_same_league_change_without_active_season() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let user_id = create_test_user(&app_state, 5, Vec::new()).await;
    let long_after_any_season = Utc::now() + Duration::days(365 * 50);

    let change = service::update_user_league(
        &app_state.db,
        app_state.league(),
        user_id,
        5,
        None,
        long_after_any_season,
    )
    .await
    .unwrap();

    assert_eq!(change.league, 5);
    assert_eq!(change.group_id, None);

    let other_league = service::update_user_league(
        &app_state.db,
        app_state.league(),
        user_id,
        6,
        None,
        long_after_any_season,
    )
    .await;
    assert!(matches!(other_league, Err(LeagueError::NoActiveSeason)));
}

#[tokio::test]
async fn test_transfer_carries_points_committed_while_waiting() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let season_id = create_test_season(&app_state).await;
    let user_id = create_test_user(&app_state, 3, Vec::new()).await;
    let old_group_id = seat(&app_state, &season_id, user_id, 3).await;
    credit(&app_state, &season_id, user_id, old_group_id, 10.0).await;

    // An in-flight submission holds the ledger row while the transfer starts.
    let mut submission = app_state.db.begin().await.unwrap();
    let submission_pid = backend_pid(&mut submission).await;
    let now = Utc::now();
    user_season_points::add_points(&mut *submission, &season_id, user_id, 5.0, now)
        .await
        .unwrap();
    group_memberships::add_points(&mut *submission, old_group_id, user_id, 5.0, now)
        .await
        .unwrap();

    let pool = app_state.db.clone();
    let params = TransferParams {
        season_id: season_id.clone(),
        user_id,
        from_group_id: Some(old_group_id),
        to_league: 4,
    };
    let moving = tokio::spawn(async move { service::transfer(&pool, &params).await });

    wait_until_blocked_by(&app_state, submission_pid).await;
    submission.commit().await.unwrap();

    let new_group_id = moving.await.unwrap().unwrap();

    let ledger = user_season_points::get(&app_state.db, &season_id, user_id)
        .await
        .unwrap()
        .unwrap();
    let membership = group_memberships::get_for_user_in_season(&app_state.db, &season_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.points, 15.0);
    assert_eq!(membership.group_id, new_group_id);
    assert_eq!(membership.points, 15.0);
}

#[tokio::test]
async fn test_transfer_into_filled_group_keeps_old_seat() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let season_id = create_test_season(&app_state).await;
    let user_id = create_test_user(&app_state, 3, Vec::new()).await;
    let old_group_id = seat(&app_state, &season_id, user_id, 3).await;
    credit(&app_state, &season_id, user_id, old_group_id, 7.0).await;

    let target = league_groups::create(
        &app_state.db,
        CreateLeagueGroup {
            season_id: season_id.clone(),
            league_number: 4,
            capacity: GROUP_CAPACITY,
        },
    )
    .await
    .unwrap();
    league_groups::set_occupancy(&app_state.db, target.id, GROUP_CAPACITY - 1, false)
        .await
        .unwrap();

    // Another admission holds the last seat of the target while the transfer starts.
    let mut rival = app_state.db.begin().await.unwrap();
    let rival_pid = backend_pid(&mut rival).await;
    league_groups::lock_by_id(&mut *rival, target.id)
        .await
        .unwrap();

    let pool = app_state.db.clone();
    let params = TransferParams {
        season_id: season_id.clone(),
        user_id,
        from_group_id: Some(old_group_id),
        to_league: 4,
    };
    let moving = tokio::spawn(async move { service::transfer(&pool, &params).await });

    wait_until_blocked_by(&app_state, rival_pid).await;
    league_groups::set_occupancy(&mut *rival, target.id, GROUP_CAPACITY, true)
        .await
        .unwrap();
    rival.commit().await.unwrap();

    let result = moving.await.unwrap();
    assert!(matches!(result, Err(LeagueError::GroupFull)), "{result:?}");

    let membership = group_memberships::get_for_user_in_season(&app_state.db, &season_id, user_id)
        .await
        .unwrap()
        .expect("old seat should survive");
    assert_eq!(membership.group_id, old_group_id);
    assert_eq!(membership.points, 7.0);

    let old_group = league_groups::get_by_id(&app_state.db, old_group_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(old_group.current_count, 1);

    let ledger = user_season_points::get(&app_state.db, &season_id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ledger.group_id, Some(old_group_id));
    assert_eq!(ledger.league, 3);

    let profile = users::get_by_id(&app_state.db, user_id).await.unwrap().unwrap();
    assert_eq!(profile.league, 3);
    assert_eq!(profile.current_group_id, Some(old_group_id));
}

#[tokio::test]
async fn test_failed_league_change_leaves_seat_untouched() {
    let Some(app_state) = setup_test_db().await else {
        return;
    };
    let season_id = create_test_season(&app_state).await;
    let user_id = create_test_user(&app_state, 2, Vec::new()).await;
    let group_id = seat(&app_state, &season_id, user_id, 2).await;

    let out_of_range = service::update_user_league(
        &app_state.db,
        app_state.league(),
        user_id,
        16,
        Some(season_id.clone()),
        Utc::now(),
    )
    .await;
    assert!(matches!(out_of_range, Err(LeagueError::OutOfRange(16))));

    let unknown_user = service::update_user_league(
        &app_state.db,
        app_state.league(),
        Uuid::new_v4(),
        3,
        Some(season_id.clone()),
        Utc::now(),
    )
    .await;
    assert!(matches!(unknown_user, Err(LeagueError::UserNotFound)));

    let group = league_groups::get_by_id(&app_state.db, group_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(group.current_count, 1);
    let profile = users::get_by_id(&app_state.db, user_id).await.unwrap().unwrap();
    assert_eq!(profile.league, 2);
    assert_eq!(profile.current_group_id, Some(group_id));
}
