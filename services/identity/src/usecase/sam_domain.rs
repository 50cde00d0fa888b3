use tracing::info;

use dirsync_domain::policy::IdentityPolicy;
use dirsync_domain::sam_domain::DomainRecord;
use dirsync_domain::unique::{UniqueField, check_unique};

use crate::domain::repository::DirectoryGateway;
use crate::domain::types::IndexedAttribute;
use crate::error::IdentityError;

fn require_compatibility(policy: &IdentityPolicy) -> Result<(), IdentityError> {
    if !policy.compatibility {
        return Err(IdentityError::InvalidValue {
            field: "domain",
            reason: "the compatibility subsystem is disabled".into(),
        });
    }
    Ok(())
}

pub struct CreateDomainUseCase<'a, D: DirectoryGateway> {
    pub directory: &'a D,
    pub policy: &'a IdentityPolicy,
}

impl<D: DirectoryGateway> CreateDomainUseCase<'_, D> {
    pub async fn execute(&self, domain: DomainRecord) -> Result<DomainRecord, IdentityError> {
        require_compatibility(self.policy)?;
        if domain.domain_name.trim().is_empty() {
            return Err(IdentityError::InvalidValue {
                field: "domain_name",
                reason: "this field is required".into(),
            });
        }
        if !domain.security_identifier_prefix.starts_with("S-") {
            return Err(IdentityError::InvalidValue {
                field: "security_identifier_prefix",
                reason: "must be a SID such as S-1-5-21-...".into(),
            });
        }

        let names = self.directory.list_values(IndexedAttribute::DomainName).await?;
        check_unique(UniqueField::DomainName, domain.domain_name.clone(), &names, None)?;
        let prefixes = self
            .directory
            .list_values(IndexedAttribute::DomainSecurityIdentifier)
            .await?;
        check_unique(
            UniqueField::SecurityIdentifierPrefix,
            domain.security_identifier_prefix.clone(),
            &prefixes,
            None,
        )?;

        self.directory.create_domain(&domain).await?;
        info!(domain = %domain.domain_name, "samba domain created");
        Ok(domain)
    }
}

pub struct ListDomainsUseCase<'a, D: DirectoryGateway> {
    pub directory: &'a D,
    pub policy: &'a IdentityPolicy,
}

impl<D: DirectoryGateway> ListDomainsUseCase<'_, D> {
    pub async fn execute(&self) -> Result<Vec<DomainRecord>, IdentityError> {
        require_compatibility(self.policy)?;
        let mut domains = self.directory.list_domains().await?;
        domains.sort_by(|a, b| a.domain_name.cmp(&b.domain_name));
        Ok(domains)
    }
}
