use std::collections::HashSet;

use futures_util::future::join_all;
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};
use shared_todo::{
    db::dao::{DaoContext, NewTodo},
    db::entities::{Priority, todo_user_status},
    error::AppError,
    services::{FanOut, ListService, MembershipGuard, ServiceContext, StatusAggregator},
    state::AppState,
    test_helpers::test_state,
};

fn service(state: &AppState) -> ListService {
    ServiceContext::from_state(state).lists()
}

async fn statuses_of(state: &AppState, todo_ids: &[i32]) -> Vec<todo_user_status::Model> {
    DaoContext::new(&state.db)
        .status()
        .list_for_todos(todo_ids)
        .await
        .expect("read statuses")
}

async fn status_row(state: &AppState, todo_id: i32, user_id: &str) -> todo_user_status::Model {
    DaoContext::new(&state.db)
        .status()
        .find(todo_id, user_id)
        .await
        .expect("read status")
        .expect("status row exists")
}

async fn todo_completed(state: &AppState, todo_id: i32) -> bool {
    DaoContext::new(&state.db)
        .todo()
        .require_todo(todo_id)
        .await
        .expect("read todo")
        .is_completed
}

#[tokio::test]
async fn fan_out_covers_every_member_and_todo() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, founder) = lists.create_list().await.expect("create list");
    let second = lists.invite_user(&list.id).await.expect("invite second");
    let third = lists.invite_user(&list.id).await.expect("invite third");
    let first_todo = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create first todo");
    let second_todo = lists
        .create_todo(&list.id, NewTodo::new("Pay rent").with_priority(Priority::High))
        .await
        .expect("create second todo");

    let rows = statuses_of(&state, &[first_todo.todo.id, second_todo.todo.id]).await;
    assert_eq!(rows.len(), 6);

    let pairs: HashSet<(i32, String)> = rows
        .iter()
        .map(|row| (row.todo_id, row.user_id.clone()))
        .collect();
    for todo_id in [first_todo.todo.id, second_todo.todo.id] {
        for user_id in [&founder.id, &second.id, &third.id] {
            assert!(pairs.contains(&(todo_id, user_id.clone())));
        }
    }
    assert!(rows.iter().all(|row| !row.is_checked && row.checked_at.is_none()));
}

#[tokio::test]
async fn members_invited_later_get_rows_for_existing_todos() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, _) = lists.create_list().await.expect("create list");
    let created = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create todo");
    assert_eq!(created.statuses.len(), 1);

    let guest = lists.invite_user(&list.id).await.expect("invite guest");
    let rows = statuses_of(&state, &[created.todo.id]).await;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|row| row.user_id == guest.id));
}

#[tokio::test]
async fn repeated_fan_out_is_a_no_op() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, founder) = lists.create_list().await.expect("create list");
    let created = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create todo");

    let fan_out = FanOut::new(DaoContext::new(&state.db));
    let again_for_user = fan_out
        .on_user_joined(&list.id, &founder.id)
        .await
        .expect("re-running user fan-out should not fail");
    let again_for_todo = fan_out
        .on_todo_created(&list.id, created.todo.id)
        .await
        .expect("re-running todo fan-out should not fail");

    assert_eq!(again_for_user, 0);
    assert_eq!(again_for_todo, 0);
    assert_eq!(statuses_of(&state, &[created.todo.id]).await.len(), 1);
}

#[tokio::test]
async fn completion_tracks_every_member() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, first) = lists.create_list().await.expect("create list");
    let second = lists.invite_user(&list.id).await.expect("invite");
    let todo_id = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create todo")
        .todo
        .id;

    assert!(lists.set_status(todo_id, &first.id, true).await.expect("first checks"));
    assert!(!todo_completed(&state, todo_id).await);

    assert!(lists.set_status(todo_id, &second.id, true).await.expect("second checks"));
    assert!(todo_completed(&state, todo_id).await);

    assert!(!lists.set_status(todo_id, &first.id, false).await.expect("first unchecks"));
    assert!(!todo_completed(&state, todo_id).await);
}

#[tokio::test]
async fn checked_at_follows_the_checked_flag() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, founder) = lists.create_list().await.expect("create list");
    let todo_id = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create todo")
        .todo
        .id;

    lists.set_status(todo_id, &founder.id, true).await.expect("check");
    let checked = status_row(&state, todo_id, &founder.id).await;
    assert!(checked.is_checked);
    assert!(checked.checked_at.is_some());

    lists.set_status(todo_id, &founder.id, false).await.expect("uncheck");
    let unchecked = status_row(&state, todo_id, &founder.id).await;
    assert!(!unchecked.is_checked);
    assert!(unchecked.checked_at.is_none());
}

#[tokio::test]
async fn todo_in_a_list_without_members_is_not_complete() {
    let state = test_state().await;
    let lists = service(&state);
    DaoContext::new(&state.db)
        .list()
        .create_list("empty-list")
        .await
        .expect("create bare list");

    let created = lists
        .create_todo("empty-list", NewTodo::new("Nobody will do this"))
        .await
        .expect("create todo");
    assert!(created.statuses.is_empty());
    assert!(!created.todo.is_completed);

    let completed = StatusAggregator::new(DaoContext::new(&state.db))
        .recompute(&created.todo)
        .await
        .expect("recompute");
    assert!(!completed);
    assert!(!todo_completed(&state, created.todo.id).await);
}

#[tokio::test]
async fn outsiders_cannot_flip_statuses() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, founder) = lists.create_list().await.expect("create list");
    let (_, outsider) = lists.create_list().await.expect("create other list");
    let todo_id = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create todo")
        .todo
        .id;
    lists.set_status(todo_id, &founder.id, true).await.expect("founder checks");
    let before = statuses_of(&state, &[todo_id]).await;

    let err = lists
        .set_status(todo_id, &outsider.id, false)
        .await
        .expect_err("outsider should be rejected");
    assert!(err.is_forbidden());

    let err = lists
        .set_status(todo_id, "no-such-user", true)
        .await
        .expect_err("unknown user should be rejected");
    assert!(err.is_forbidden());

    let after = statuses_of(&state, &[todo_id]).await;
    assert_eq!(before, after);
    assert!(todo_completed(&state, todo_id).await);

    let guard = MembershipGuard::new(DaoContext::new(&state.db));
    assert!(guard.is_member(&list.id, &founder.id).await.expect("member check"));
    assert!(!guard.is_member(&list.id, &outsider.id).await.expect("outsider check"));
}

#[tokio::test]
async fn missing_targets_are_not_found() {
    let state = test_state().await;
    let lists = service(&state);
    let (list, founder) = lists.create_list().await.expect("create list");

    let err = lists
        .set_status(9999, &founder.id, true)
        .await
        .expect_err("unknown todo");
    assert!(err.is_not_found());

    let err = lists.invite_user("missing-list").await.expect_err("unknown list");
    assert!(err.is_not_found());

    let err = lists
        .create_todo("missing-list", NewTodo::new("x"))
        .await
        .expect_err("unknown list");
    assert!(err.is_not_found());

    let err = lists
        .list_snapshot("missing-list", &founder.id)
        .await
        .expect_err("unknown list");
    assert!(err.is_not_found());

    let err = lists
        .update_memo("missing-list", "memo")
        .await
        .expect_err("unknown list");
    assert!(err.is_not_found());

    let err = lists
        .rename_user(&list.id, "no-such-user", "Ann")
        .await
        .expect_err("unknown member");
    assert!(err.is_forbidden());
}

#[tokio::test]
async fn shared_list_walkthrough() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, founder) = lists.create_list().await.expect("create list");
    let guest = lists.invite_user(&list.id).await.expect("invite guest");
    let created = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create todo");
    let todo_id = created.todo.id;

    assert_eq!(created.statuses.len(), 2);
    assert!(created.statuses.iter().all(|status| !status.is_checked));
    assert!(!created.todo.is_completed);

    lists.set_status(todo_id, &founder.id, true).await.expect("founder checks");
    assert!(!todo_completed(&state, todo_id).await);

    lists.set_status(todo_id, &guest.id, true).await.expect("guest checks");
    assert!(todo_completed(&state, todo_id).await);

    lists.set_status(todo_id, &guest.id, false).await.expect("guest unchecks");
    assert!(!todo_completed(&state, todo_id).await);
}

#[tokio::test]
async fn inviting_a_member_reopens_completed_todos() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, founder) = lists.create_list().await.expect("create list");
    let todo_id = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create todo")
        .todo
        .id;
    lists.set_status(todo_id, &founder.id, true).await.expect("check");
    assert!(todo_completed(&state, todo_id).await);

    let guest = lists.invite_user(&list.id).await.expect("invite");
    assert!(!todo_completed(&state, todo_id).await);

    lists.set_status(todo_id, &guest.id, true).await.expect("guest checks");
    assert!(todo_completed(&state, todo_id).await);
}

#[tokio::test]
async fn snapshot_orders_members_todos_and_statuses() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, founder) = lists.create_list().await.expect("create list");
    let guest = lists.invite_user(&list.id).await.expect("invite");
    lists
        .rename_user(&list.id, &guest.id, "Guest")
        .await
        .expect("rename guest");
    lists.update_memo(&list.id, "weekly shop").await.expect("memo");
    let first = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("first todo");
    let second = lists
        .create_todo(&list.id, NewTodo::new("Buy eggs"))
        .await
        .expect("second todo");

    let snapshot = lists
        .list_snapshot(&list.id, &guest.id)
        .await
        .expect("snapshot");

    assert_eq!(snapshot.list.memo, "weekly shop");
    let user_ids: Vec<&str> = snapshot.users.iter().map(|user| user.id.as_str()).collect();
    assert_eq!(user_ids, vec![founder.id.as_str(), guest.id.as_str()]);
    assert_eq!(snapshot.users[1].display_name, "Guest");

    let todo_ids: Vec<i32> = snapshot.todos.iter().map(|todo| todo.todo.id).collect();
    assert_eq!(todo_ids, vec![first.todo.id, second.todo.id]);
    for todo in &snapshot.todos {
        let status_users: Vec<&str> = todo
            .statuses
            .iter()
            .map(|status| status.user_id.as_str())
            .collect();
        assert_eq!(status_users, user_ids);
    }

    let (_, outsider) = lists.create_list().await.expect("other list");
    let err = lists
        .list_snapshot(&list.id, &outsider.id)
        .await
        .expect_err("outsider snapshot");
    assert!(err.is_forbidden());
}

#[tokio::test]
async fn purge_removes_the_list_and_its_rows() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, founder) = lists.create_list().await.expect("create list");
    lists.invite_user(&list.id).await.expect("invite");
    let todo_id = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create todo")
        .todo
        .id;

    let summary = lists.purge_list(&list.id).await.expect("purge");
    assert_eq!(summary.statuses, 2);
    assert_eq!(summary.todos, 1);
    assert_eq!(summary.users, 2);

    assert!(statuses_of(&state, &[todo_id]).await.is_empty());
    let err = lists
        .list_snapshot(&list.id, &founder.id)
        .await
        .expect_err("purged list");
    assert!(err.is_not_found());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_checks_all_count() {
    let state = test_state().await;
    let lists = service(&state);

    let (list, founder) = lists.create_list().await.expect("create list");
    let mut members = vec![founder];
    for _ in 0..4 {
        members.push(lists.invite_user(&list.id).await.expect("invite"));
    }
    let todo_id = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("create todo")
        .todo
        .id;

    let handles = members.iter().map(|member| {
        let lists = lists.clone();
        let user_id = member.id.clone();
        tokio::spawn(async move { lists.set_status(todo_id, &user_id, true).await })
    });
    for result in join_all(handles).await {
        assert!(result.expect("task should join").expect("check should succeed"));
    }

    assert!(todo_completed(&state, todo_id).await);
    let rows = statuses_of(&state, &[todo_id]).await;
    assert_eq!(rows.len(), members.len());
    assert!(rows.iter().all(|row| row.is_checked));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invites_and_todos_stay_fully_fanned_out() {
    let state = test_state().await;
    let lists = service(&state);
    let (list, _) = lists.create_list().await.expect("create list");

    let invites = (0..3).map(|_| {
        let lists = lists.clone();
        let list_id = list.id.clone();
        tokio::spawn(async move { lists.invite_user(&list_id).await.map(|_| ()) })
    });
    let todos = (0..3).map(|n| {
        let lists = lists.clone();
        let list_id = list.id.clone();
        tokio::spawn(async move {
            lists
                .create_todo(&list_id, NewTodo::new(format!("todo {n}")))
                .await
                .map(|_| ())
        })
    });
    let handles: Vec<_> = invites.chain(todos).collect();
    for result in join_all(handles).await {
        result.expect("task should join").expect("operation should succeed");
    }

    let snapshot_user = DaoContext::new(&state.db)
        .user()
        .list_members(&list.id)
        .await
        .expect("members");
    assert_eq!(snapshot_user.len(), 4);

    let snapshot = lists
        .list_snapshot(&list.id, &snapshot_user[0].id)
        .await
        .expect("snapshot");
    assert_eq!(snapshot.todos.len(), 3);
    for todo in &snapshot.todos {
        assert_eq!(todo.statuses.len(), 4);
        assert!(!todo.todo.is_completed);
    }
}

#[tokio::test]
async fn failed_fan_out_leaves_no_rows_behind() {
    let state = test_state().await;
    let lists = service(&state);
    let (list, _) = lists.create_list().await.expect("create list");
    let invited = lists.invite_user(&list.id).await.expect("invite");

    state
        .db
        .execute_unprepared(&format!(
            "CREATE TRIGGER reject_status BEFORE INSERT ON todo_user_status \
             WHEN NEW.user_id = '{}' BEGIN SELECT RAISE(ABORT, 'status rejected'); END;",
            invited.id
        ))
        .await
        .expect("install trigger");

    let err = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect_err("fan-out should fail");
    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(err.message(), "storage failure");

    let todos = DaoContext::new(&state.db)
        .todo()
        .list_todos(&list.id)
        .await
        .expect("read todos");
    assert!(todos.is_empty());
    let leftover = todo_user_status::Entity::find()
        .count(&state.db)
        .await
        .expect("count statuses");
    assert_eq!(leftover, 0);

    state
        .db
        .execute_unprepared("DROP TRIGGER reject_status;")
        .await
        .expect("drop trigger");

    let retried = lists
        .create_todo(&list.id, NewTodo::new("Buy milk"))
        .await
        .expect("retry should succeed");
    assert_eq!(retried.statuses.len(), 2);
    assert_eq!(statuses_of(&state, &[retried.todo.id]).await.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn check_racing_an_invite_never_completes_the_todo() {
    let state = test_state().await;
    let lists = service(&state);

    for _ in 0..10 {
        let (list, founder) = lists.create_list().await.expect("create list");
        let todo_id = lists
            .create_todo(&list.id, NewTodo::new("Buy milk"))
            .await
            .expect("create todo")
            .todo
            .id;

        let check = {
            let lists = lists.clone();
            let founder_id = founder.id.clone();
            tokio::spawn(async move { lists.set_status(todo_id, &founder_id, true).await })
        };
        let invite = {
            let lists = lists.clone();
            let list_id = list.id.clone();
            tokio::spawn(async move { lists.invite_user(&list_id).await })
        };

        let checked = check.await.expect("check task should join");
        let invited = invite.await.expect("invite task should join");
        checked.expect("check should succeed");
        let invited = invited.expect("invite should succeed");

        assert!(!todo_completed(&state, todo_id).await);
        let rows = statuses_of(&state, &[todo_id]).await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().any(|row| row.user_id == invited.id && !row.is_checked));
    }
}
