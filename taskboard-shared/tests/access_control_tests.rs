/// Project and task access checks against a real PostgreSQL
///
/// Skipped when `DATABASE_URL` is not set.

mod common;

use common::{auth, create_project, create_user, insert_task, test_pool};
use taskboard_shared::auth::authorization::{
    require_project_owner, require_task_access, verify_project_access_using_task_id,
    verify_user_access_to_project, AccessDecision, AuthzError,
};
use uuid::Uuid;

#[tokio::test]
async fn test_owner_and_member_allowed_outsider_denied() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let owner = create_user(&pool, "owner").await;
    let member = create_user(&pool, "member").await;
    let outsider = create_user(&pool, "outsider").await;
    let project = create_project(&pool, &owner, &[member.id]).await;

    for user in [&owner, &member] {
        let decision = verify_user_access_to_project(&pool, project.id, Some(user.id))
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::Allowed);
        assert_eq!(decision.reason(), None);
    }

    let decision = verify_user_access_to_project(&pool, project.id, Some(outsider.id))
        .await
        .unwrap();
    assert!(!decision.is_allowed());
    assert!(decision.reason().is_some());
}

#[tokio::test]
async fn test_unknown_project_denied() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let user = create_user(&pool, "lonely").await;
    let decision = verify_user_access_to_project(&pool, Uuid::new_v4(), Some(user.id))
        .await
        .unwrap();
    assert!(matches!(decision, AccessDecision::Denied(_)));
}

#[tokio::test]
async fn test_task_access_matches_project_access() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let owner = create_user(&pool, "owner").await;
    let member = create_user(&pool, "member").await;
    let outsider = create_user(&pool, "outsider").await;
    let project = create_project(&pool, &owner, &[member.id]).await;
    let task = insert_task(&pool, &owner, Some(project.id), "Scoped").await;

    for user in [&owner, &member, &outsider] {
        let via_task = verify_project_access_using_task_id(&pool, task.id, Some(user.id))
            .await
            .unwrap();
        let via_project = verify_user_access_to_project(&pool, project.id, Some(user.id))
            .await
            .unwrap();
        assert_eq!(via_task, via_project);
    }
}

#[tokio::test]
async fn test_task_without_project_always_denied() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let creator = create_user(&pool, "creator").await;
    let task = insert_task(&pool, &creator, None, "Personal").await;

    let decision = verify_project_access_using_task_id(&pool, task.id, Some(creator.id))
        .await
        .unwrap();
    assert!(!decision.is_allowed());
    assert!(decision.reason().unwrap_or_default().contains("no associated project"));

    let err = require_task_access(&pool, task.id, &auth(&creator))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthzError::Forbidden(_)));
}

#[tokio::test]
async fn test_missing_task_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let user = create_user(&pool, "seeker").await;
    let missing = Uuid::new_v4();

    let decision = verify_project_access_using_task_id(&pool, missing, Some(user.id))
        .await
        .unwrap();
    assert_eq!(decision, AccessDecision::NotFound);

    let err = require_task_access(&pool, missing, &auth(&user)).await.unwrap_err();
    assert!(matches!(err, AuthzError::TaskNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_project_owner_check() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let owner = create_user(&pool, "owner").await;
    let member = create_user(&pool, "member").await;
    let project = create_project(&pool, &owner, &[member.id]).await;

    let found = require_project_owner(&pool, project.id, &auth(&owner)).await.unwrap();
    assert_eq!(found.id, project.id);

    assert!(matches!(
        require_project_owner(&pool, project.id, &auth(&member)).await,
        Err(AuthzError::NotOwner)
    ));
    assert!(matches!(
        require_project_owner(&pool, Uuid::new_v4(), &auth(&owner)).await,
        Err(AuthzError::ProjectNotFound(_))
    ));
}
