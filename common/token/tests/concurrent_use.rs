use std::collections::HashSet;
use std::sync::Arc;

use chrono::Duration;
use common_token::{IdentityClaims, SigningConfig, TokenMetrics, TokenProvider, TokenService};

fn shared_service() -> Arc<TokenService> {
    let config = SigningConfig::new("s3cr3t-key-32-bytes-min", "svc", "api", Duration::minutes(15))
        .expect("config");
    Arc::new(TokenService::new(config).with_metrics(TokenMetrics::new().expect("metrics")))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_service_issues_and_validates_across_tasks() {
    let service = shared_service();
    let mut handles = Vec::new();

    for worker in 0..16 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let claims = IdentityClaims::builder(format!("u-{worker}"))
                .email(format!("user{worker}@example.com"))
                .username(format!("user{worker}"))
                .roles(["reader", "writer"])
                .build()
                .expect("claims");

            let mut token_ids = Vec::new();
            for _ in 0..25 {
                let issued = service.issue_tokens(&claims).expect("issue");
                let validated = service
                    .validate_token(issued.access_token.as_str())
                    .expect("valid");
                assert_eq!(validated.subject(), claims.subject());
                assert_eq!(validated.roles(), claims.roles());
                token_ids.push(issued.access_token.token_id());
            }
            token_ids
        }));
    }

    let mut all_ids = HashSet::new();
    for handle in handles {
        for id in handle.await.expect("task") {
            assert!(all_ids.insert(id), "duplicate token id {id}");
        }
    }
    assert_eq!(all_ids.len(), 16 * 25);

    let metrics = service.metrics().expect("metrics");
    assert_eq!(metrics.issued_count("access"), 400);
    assert_eq!(metrics.issued_count("refresh"), 400);
    assert_eq!(metrics.validation_count("valid"), 400);
}
