use dirsync_identity::error::IdentityError;

use crate::helpers::{DOMAIN_PREFIX, compat_service, service};

#[tokio::test]
async fn should_create_domains_with_unique_prefixes() {
    let service = compat_service();
    service.create_domain("ADMIN", "S-1-5-21-42").await.unwrap();

    let err = service
        .create_domain("OTHER", DOMAIN_PREFIX)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Domain SID already assigned. Choose something else.");

    let names: Vec<_> = service
        .list_domains()
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.domain_name)
        .collect();
    assert_eq!(names, vec!["ADMIN", "STATS"]);
}

#[tokio::test]
async fn should_reject_domains_without_compatibility() {
    let service = service();
    assert!(matches!(
        service.list_domains().await.unwrap_err(),
        IdentityError::InvalidValue { field: "domain", .. }
    ));
}
