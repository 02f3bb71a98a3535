mod utils;

use keyhub::config::DeletePolicy;
use keyhub::error::AppError;
use keyhub::services::accounts::RegisterRequest;
use utils::{memory_state, TEST_PASSWORD};

#[tokio::test]
async fn test_username_length_checked_after_trim() {
    let state = memory_state(DeletePolicy::AlwaysSucceed);

    let err = state
        .accounts
        .register(RegisterRequest {
            username: "  ab  ".to_string(),
            email: "ab@example.com".to_string(),
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let user = state
        .accounts
        .register(RegisterRequest {
            username: "  abc  ".to_string(),
            email: " abc@example.com ".to_string(),
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .unwrap();
    assert_eq!(user.username, "abc");
    assert_eq!(user.email, "abc@example.com");
}

#[tokio::test]
async fn test_admin_setup_applies_same_rules() {
    let state = memory_state(DeletePolicy::AlwaysSucceed);

    let err = state
        .accounts
        .create_admin(RegisterRequest {
            username: "   x".to_string(),
            email: "root@example.com".to_string(),
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(!state.accounts.is_setup_complete().await.unwrap());
}
