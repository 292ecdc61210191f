mod support;

use support::{assigned, config_with_fetch_size, task, ts, Call, FakeTaskApi};
use taskboard::actor::Actor;
use taskboard::board::{Board, RefreshOutcome};
use taskboard::cache::fetch_all_tasks;
use taskboard::config::Config;
use taskboard::filter::TaskFilter;
use taskboard::notify::NotificationLevel;
use taskboard::policy::Role;
use taskboard::task::{ServiceRequestRef, ServiceRequestSummary, TaskStatus, UserSummary};
use taskboard::Error;

fn many(count: usize) -> Vec<taskboard::task::Task> {
    (0..count)
        .map(|idx| task(&format!("t{idx:02}"), TaskStatus::Todo))
        .collect()
}

#[tokio::test]
async fn three_pages_mean_two_extra_requests() {
    let api = FakeTaskApi::new(many(25));
    let tasks = fetch_all_tasks(&api, &TaskFilter::default(), 10)
        .await
        .expect("fetch");

    assert_eq!(tasks.len(), 25);
    let pages: Vec<usize> = api
        .calls()
        .iter()
        .filter_map(|call| match call {
            Call::ListTasks { page, limit, .. } => {
                assert_eq!(*limit, 10);
                Some(*page)
            }
            _ => None,
        })
        .collect();
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0], 1);
    let mut rest = pages[1..].to_vec();
    rest.sort_unstable();
    assert_eq!(rest, vec![2, 3]);

    // Pages are concatenated in page order.
    let ids: Vec<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
    let expected: Vec<String> = (0..25).map(|idx| format!("t{idx:02}")).collect();
    assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn single_page_makes_one_request() {
    let api = FakeTaskApi::new(many(3));
    fetch_all_tasks(&api, &TaskFilter::default(), 1000)
        .await
        .expect("fetch");
    assert_eq!(api.list_calls(), 1);
}

#[tokio::test]
async fn results_are_newest_first() {
    let mut old = task("old", TaskStatus::Todo);
    old.created_at = Some(ts(1));
    let mut new = task("new", TaskStatus::Todo);
    new.created_at = Some(ts(9));
    let undated = task("undated", TaskStatus::Todo);

    let api = FakeTaskApi::new(vec![undated, old, new]);
    let tasks = fetch_all_tasks(&api, &TaskFilter::default(), 1)
        .await
        .expect("fetch");
    let ids: Vec<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
    assert_eq!(ids, vec!["new", "old", "undated"]);
}

#[tokio::test]
async fn service_request_filter_applies_after_join() {
    let mut linked = task("linked", TaskStatus::Todo);
    linked.service_request_id = Some(ServiceRequestRef::Id("sr-1".to_string()));
    let api = FakeTaskApi::new(vec![linked, task("other", TaskStatus::Todo)]);

    let filter = TaskFilter {
        service_request_id: Some("sr-1".to_string()),
        ..TaskFilter::default()
    };
    let tasks = fetch_all_tasks(&api, &filter, 1).await.expect("fetch");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, "linked");
}

#[tokio::test]
async fn failed_page_fails_refresh_and_keeps_cache() {
    let mut board = Board::new(
        FakeTaskApi::new(many(5)),
        Actor::admin(),
        &config_with_fetch_size(2),
    );
    board.refresh().await.expect("first refresh");
    assert_eq!(board.cache().len(), 5);

    board.api().set_tasks(many(8));
    board.api().fail_page(Some(3));
    let err = board.refresh().await.expect_err("page 3 fails");
    assert!(matches!(err, Error::Api { status: 500, .. }));

    assert_eq!(board.cache().len(), 5);
    assert!(!board.is_loading());
    let notes = board.drain_notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
}

#[tokio::test]
async fn refresh_while_loading_is_skipped() {
    let mut board = Board::new(FakeTaskApi::new(many(2)), Actor::admin(), &Config::default());

    let filter = board
        .begin_refresh()
        .expect("actor scoped")
        .expect("first refresh starts");
    assert!(board.is_loading());
    assert!(board.begin_refresh().expect("actor scoped").is_none());
    assert_eq!(
        board.refresh().await.expect("skipped"),
        RefreshOutcome::AlreadyLoading
    );
    assert_eq!(board.api().list_calls(), 0);

    let tasks = fetch_all_tasks(board.api(), &filter, 1000)
        .await
        .expect("fetch");
    let outcome = board.finish_refresh(Ok(tasks)).expect("finish");
    assert_eq!(outcome, RefreshOutcome::Loaded { count: 2 });
    assert!(!board.is_loading());
}

#[tokio::test]
async fn refresh_resets_column_pages() {
    let mut board = Board::new(FakeTaskApi::new(many(30)), Actor::admin(), &Config::default());
    board.refresh().await.expect("refresh");
    board.set_page(TaskStatus::Todo, 3).expect("page");
    assert_eq!(board.column(TaskStatus::Todo).expect("column").current_page, 3);

    board.refresh().await.expect("refresh");
    assert_eq!(board.column(TaskStatus::Todo).expect("column").current_page, 1);
}

#[tokio::test]
async fn set_filter_resets_pages() {
    let mut board = Board::new(FakeTaskApi::new(many(30)), Actor::admin(), &Config::default());
    board.refresh().await.expect("refresh");
    board.set_page(TaskStatus::Todo, 2).expect("page");

    board.set_filter(TaskFilter {
        status: Some(TaskStatus::Todo),
        ..TaskFilter::default()
    });
    assert_eq!(
        board.pagination().get(TaskStatus::Todo).expect("column").page,
        1
    );
}

#[tokio::test]
async fn users_only_fetch_their_own_tasks() {
    let tasks = vec![
        assigned("mine", TaskStatus::Todo, "u1"),
        assigned("theirs", TaskStatus::Todo, "u2"),
    ];
    let mut board = Board::new(FakeTaskApi::new(tasks), Actor::user("u1"), &Config::default());
    board.set_filter(TaskFilter {
        assigned_user_id: Some("u2".to_string()),
        ..TaskFilter::default()
    });
    board.refresh().await.expect("refresh");

    assert_eq!(board.cache().len(), 1);
    assert!(board.task("mine").is_some());
    assert!(matches!(
        board.api().calls().first(),
        Some(Call::ListTasks { assigned_user_id: Some(user), .. }) if user == "u1"
    ));
}

#[tokio::test]
async fn user_without_id_is_refused_before_fetching() {
    let tasks = vec![
        assigned("mine", TaskStatus::Todo, "u1"),
        assigned("theirs", TaskStatus::Todo, "u2"),
    ];
    let mut board = Board::new(
        FakeTaskApi::new(tasks),
        Actor::new(Role::User, None),
        &Config::default(),
    );

    let err = board.refresh().await.expect_err("unscoped user");
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(board.cache().is_empty());
    assert!(!board.is_loading());
    assert!(board.api().calls().is_empty());
}

#[tokio::test]
async fn refresh_closes_detail_of_vanished_task() {
    let mut board = Board::new(FakeTaskApi::new(many(2)), Actor::admin(), &Config::default());
    board.refresh().await.expect("refresh");
    board.open_detail("t00").expect("detail");

    board.api().set_tasks(vec![task("t01", TaskStatus::Todo)]);
    board.refresh().await.expect("refresh");
    assert!(board.detail().is_none());
}

#[tokio::test]
async fn lookups_load_users_and_requests() {
    let api = FakeTaskApi::new(Vec::new()).with_lookups(
        vec![UserSummary {
            id: "u1".to_string(),
            name: Some("Sam".to_string()),
            email: None,
        }],
        vec![ServiceRequestSummary {
            id: "sr-1".to_string(),
            title: Some("Brand film".to_string()),
        }],
    );
    let mut board = Board::new(api, Actor::admin(), &Config::default());
    board.load_lookups().await.expect("lookups");

    assert_eq!(board.users().len(), 1);
    assert_eq!(board.service_requests()[0].id, "sr-1");
    let calls = board.api().calls();
    assert!(calls.contains(&Call::ListUsers));
    assert!(calls.contains(&Call::ListServiceRequests));
}
