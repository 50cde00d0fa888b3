use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, LdapResult, Mod, Scope, SearchEntry};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use dirsync_domain::group::GroupRecord;
use dirsync_domain::sam_domain::DomainRecord;
use dirsync_domain::unique::UniqueField;
use dirsync_domain::user::{CompatibilityFields, UserRecord};

use crate::domain::repository::DirectoryGateway;
use crate::domain::types::IndexedAttribute;
use crate::error::IdentityError;

const LDAP_SUCCESS: u32 = 0;
const LDAP_NO_SUCH_OBJECT: u32 = 32;
const LDAP_INVALID_CREDENTIALS: u32 = 49;
const LDAP_ALREADY_EXISTS: u32 = 68;

const PEOPLE_OU: &str = "ou=People";
const GROUPS_OU: &str = "ou=Groups";

const USER_CLASSES: [&str; 3] = ["posixAccount", "shadowAccount", "inetOrgPerson"];
const SAMBA_USER_CLASS: &str = "sambaSamAccount";
const GROUP_CLASS: &str = "posixGroup";
const DOMAIN_CLASS: &str = "sambaDomain";
const OBJECT_CLASS: &str = "objectClass";

#[derive(Debug, Clone)]
pub struct LdapSettings {
    pub url: String,
    pub bind_dn: String,
    pub bind_password: String,
    pub base_dn: String,
    pub connect_timeout: Duration,
}

/// Directory gateway backed by an LDAP server.
///
/// The bound connection is opened on first use and shared afterwards.
pub struct LdapDirectory {
    settings: LdapSettings,
    connection: Arc<RwLock<Option<Ldap>>>,
}

impl LdapDirectory {
    pub fn new(settings: LdapSettings) -> Self {
        Self {
            settings,
            connection: Arc::new(RwLock::new(None)),
        }
    }

    async fn connection(&self) -> Result<Ldap, IdentityError> {
        if let Some(ldap) = self.connection.read().await.as_ref() {
            return Ok(ldap.clone());
        }
        let mut slot = self.connection.write().await;
        if let Some(ldap) = slot.as_ref() {
            return Ok(ldap.clone());
        }
        let ldap = self.connect().await?;
        *slot = Some(ldap.clone());
        Ok(ldap)
    }

    /// Drop the cached connection so the next call reconnects.
    async fn forget_connection(&self) {
        self.connection.write().await.take();
    }

    async fn connect(&self) -> Result<Ldap, IdentityError> {
        let url = &self.settings.url;
        debug!(url = %url, "connecting to LDAP server");
        let settings = LdapConnSettings::new().set_conn_timeout(self.settings.connect_timeout);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, url)
            .await
            .with_context(|| format!("connect to {url}"))?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let result = ldap
            .simple_bind(&self.settings.bind_dn, &self.settings.bind_password)
            .await
            .with_context(|| format!("bind as {}", self.settings.bind_dn))?;
        if result.rc == LDAP_INVALID_CREDENTIALS {
            return Err(anyhow::anyhow!("invalid credentials for {}", self.settings.bind_dn).into());
        }
        check(result, "bind")?;
        info!(url = %url, "LDAP connection established");
        Ok(ldap)
    }

    fn people_dn(&self) -> String {
        format!("{PEOPLE_OU},{}", self.settings.base_dn)
    }

    fn groups_dn(&self) -> String {
        format!("{GROUPS_OU},{}", self.settings.base_dn)
    }

    fn user_dn(&self, username: &str) -> String {
        format!("uid={},{}", escape_dn_value(username), self.people_dn())
    }

    fn group_dn(&self, name: &str) -> String {
        format!("cn={},{}", escape_dn_value(name), self.groups_dn())
    }

    fn domain_dn(&self, name: &str) -> String {
        format!(
            "sambaDomainName={},{}",
            escape_dn_value(name),
            self.settings.base_dn
        )
    }

    /// Search `base` with `scope`. A missing base reads as no entries.
    async fn search(
        &self,
        base: &str,
        scope: Scope,
        filter: &str,
        attrs: Vec<&str>,
    ) -> Result<Vec<SearchEntry>, IdentityError> {
        let mut ldap = self.connection().await?;
        debug!(base, filter, "LDAP search");
        let outcome = ldap.search(base, scope, filter, attrs).await;
        let ldap3::SearchResult(entries, result) = match outcome {
            Ok(found) => found,
            Err(e) => {
                self.forget_connection().await;
                return Err(anyhow::Error::new(e).context(format!("search {base}")).into());
            }
        };
        if result.rc == LDAP_NO_SUCH_OBJECT {
            return Ok(Vec::new());
        }
        check(result, "search")?;
        Ok(entries.into_iter().map(SearchEntry::construct).collect())
    }

    async fn find_one(
        &self,
        base: &str,
        class: &str,
        attr: &str,
        value: &str,
    ) -> Result<Option<SearchEntry>, IdentityError> {
        let filter = format!("(&(objectClass={class})({attr}={}))", escape_filter_value(value));
        Ok(self
            .search(base, Scope::OneLevel, &filter, vec!["*"])
            .await?
            .into_iter()
            .next())
    }

    async fn list_all(&self, base: &str, class: &str) -> Result<Vec<SearchEntry>, IdentityError> {
        self.search(base, Scope::OneLevel, &format!("(objectClass={class})"), vec!["*"])
            .await
    }

    async fn add(
        &self,
        dn: &str,
        attrs: Vec<Attribute>,
        field: UniqueField,
        key: &str,
    ) -> Result<(), IdentityError> {
        let mut ldap = self.connection().await?;
        let attrs: Vec<(Vec<u8>, HashSet<Vec<u8>>)> = attrs
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(name, values)| (name.as_bytes().to_vec(), values.into_iter().collect()))
            .collect();
        debug!(dn, "LDAP add");
        let result = match ldap.add(dn, attrs).await {
            Ok(result) => result,
            Err(e) => {
                self.forget_connection().await;
                return Err(anyhow::Error::new(e).context(format!("add {dn}")).into());
            }
        };
        if result.rc == LDAP_ALREADY_EXISTS {
            return Err(IdentityError::DuplicateValue {
                field,
                value: key.to_owned(),
            });
        }
        check(result, "add")
    }

    /// Object classes of the entry at `dn`, or `None` when it does not exist.
    async fn object_classes(&self, dn: &str) -> Result<Option<Vec<String>>, IdentityError> {
        Ok(self
            .search(dn, Scope::Base, "(objectClass=*)", vec![OBJECT_CLASS])
            .await?
            .first()
            .map(|entry| values(entry, OBJECT_CLASS).to_vec()))
    }

    /// Replace every attribute except the RDN and add missing object classes.
    /// Returns `false` when `dn` is absent.
    async fn replace(
        &self,
        dn: &str,
        attrs: Vec<Attribute>,
        rdn: &str,
    ) -> Result<bool, IdentityError> {
        let Some(existing) = self.object_classes(dn).await? else {
            return Ok(false);
        };
        let mods = modify_mods(attrs, rdn, &existing);
        let mut ldap = self.connection().await?;
        debug!(dn, "LDAP modify");
        let result = match ldap.modify(dn, mods).await {
            Ok(result) => result,
            Err(e) => {
                self.forget_connection().await;
                return Err(anyhow::Error::new(e).context(format!("modify {dn}")).into());
            }
        };
        if result.rc == LDAP_NO_SUCH_OBJECT {
            return Ok(false);
        }
        check(result, "modify")?;
        Ok(true)
    }
}

fn check(result: LdapResult, operation: &str) -> Result<(), IdentityError> {
    if result.rc != LDAP_SUCCESS {
        return Err(anyhow::anyhow!(
            "LDAP {operation} failed with code {}: {}",
            result.rc,
            result.text
        )
        .into());
    }
    Ok(())
}

impl DirectoryGateway for LdapDirectory {
    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, IdentityError> {
        self.find_one(&self.people_dn(), "posixAccount", "uid", username)
            .await?
            .map(|entry| user_from_entry(&entry))
            .transpose()
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, IdentityError> {
        self.list_all(&self.people_dn(), "posixAccount")
            .await?
            .iter()
            .map(user_from_entry)
            .collect()
    }

    async fn create_user(&self, user: &UserRecord) -> Result<(), IdentityError> {
        self.add(
            &self.user_dn(&user.username),
            user_attributes(user),
            UniqueField::Username,
            &user.username,
        )
        .await
    }

    async fn update_user(&self, user: &UserRecord) -> Result<(), IdentityError> {
        if !self
            .replace(&self.user_dn(&user.username), user_attributes(user), "uid")
            .await?
        {
            return Err(IdentityError::UserNotFound(user.username.clone()));
        }
        Ok(())
    }

    async fn find_group(&self, name: &str) -> Result<Option<GroupRecord>, IdentityError> {
        self.find_one(&self.groups_dn(), GROUP_CLASS, "cn", name)
            .await?
            .map(|entry| group_from_entry(&entry))
            .transpose()
    }

    async fn list_groups(&self) -> Result<Vec<GroupRecord>, IdentityError> {
        self.list_all(&self.groups_dn(), GROUP_CLASS)
            .await?
            .iter()
            .map(group_from_entry)
            .collect()
    }

    async fn create_group(&self, group: &GroupRecord) -> Result<(), IdentityError> {
        self.add(
            &self.group_dn(&group.name),
            group_attributes(group),
            UniqueField::GroupName,
            &group.name,
        )
        .await
    }

    async fn update_group(&self, group: &GroupRecord) -> Result<(), IdentityError> {
        if !self
            .replace(&self.group_dn(&group.name), group_attributes(group), "cn")
            .await?
        {
            return Err(IdentityError::GroupNotFound(group.name.clone()));
        }
        Ok(())
    }

    async fn find_domain(&self, name: &str) -> Result<Option<DomainRecord>, IdentityError> {
        Ok(self
            .find_one(&self.settings.base_dn, DOMAIN_CLASS, "sambaDomainName", name)
            .await?
            .map(|entry| domain_from_entry(&entry)))
    }

    async fn list_domains(&self) -> Result<Vec<DomainRecord>, IdentityError> {
        Ok(self
            .list_all(&self.settings.base_dn, DOMAIN_CLASS)
            .await?
            .iter()
            .map(domain_from_entry)
            .collect())
    }

    async fn create_domain(&self, domain: &DomainRecord) -> Result<(), IdentityError> {
        self.add(
            &self.domain_dn(&domain.domain_name),
            domain_attributes(domain),
            UniqueField::DomainName,
            &domain.domain_name,
        )
        .await
    }

    async fn list_values(&self, attribute: IndexedAttribute) -> Result<Vec<String>, IdentityError> {
        let (base, class, attr) = match attribute {
            IndexedAttribute::Username => (self.people_dn(), "posixAccount", "uid"),
            IndexedAttribute::Uid => (self.people_dn(), "posixAccount", "uidNumber"),
            IndexedAttribute::UserSecurityIdentifier => {
                (self.people_dn(), SAMBA_USER_CLASS, "sambaSID")
            }
            IndexedAttribute::GroupName => (self.groups_dn(), GROUP_CLASS, "cn"),
            IndexedAttribute::Gid => (self.groups_dn(), GROUP_CLASS, "gidNumber"),
            IndexedAttribute::DomainName => {
                (self.settings.base_dn.clone(), DOMAIN_CLASS, "sambaDomainName")
            }
            IndexedAttribute::DomainSecurityIdentifier => {
                (self.settings.base_dn.clone(), DOMAIN_CLASS, "sambaSID")
            }
        };
        let entries = self
            .search(&base, Scope::OneLevel, &format!("(objectClass={class})"), vec![attr])
            .await?;
        Ok(entries
            .iter()
            .filter_map(|entry| first(entry, attr))
            .map(str::to_owned)
            .collect())
    }
}

// ── attribute mapping ────────────────────────────────────────────────────────

type Attribute = (&'static str, Vec<Vec<u8>>);

fn text(name: &'static str, value: &str) -> Attribute {
    let values = if value.is_empty() {
        Vec::new()
    } else {
        vec![value.as_bytes().to_vec()]
    };
    (name, values)
}

fn number(name: &'static str, value: impl ToString) -> Attribute {
    (name, vec![value.to_string().into_bytes()])
}

fn classes(names: &[&str]) -> Attribute {
    (
        OBJECT_CLASS,
        names.iter().map(|n| n.as_bytes().to_vec()).collect(),
    )
}

fn user_attributes(user: &UserRecord) -> Vec<Attribute> {
    let mut object_classes = USER_CLASSES.to_vec();
    if user.compat.is_some() {
        object_classes.push(SAMBA_USER_CLASS);
    }
    let mut attrs = vec![
        classes(&object_classes),
        text("uid", &user.username),
        number("uidNumber", user.uid),
        number("gidNumber", user.gid),
        text("givenName", &user.first_name),
        text("sn", &user.last_name),
        text("cn", &user.full_name),
        text("mail", &user.email),
        text("telephoneNumber", &user.phone),
        text("mobile", user.mobile_phone.as_deref().unwrap_or_default()),
        ("jpegPhoto", user.photo.iter().cloned().collect()),
        text("gecos", &user.gecos),
        text("homeDirectory", &user.home_directory),
        text("loginShell", &user.login_shell),
        text("userPassword", &user.password_hash),
    ];
    if let Some(compat) = &user.compat {
        attrs.extend([
            text("sambaDomainName", &compat.domain),
            text("sambaAcctFlags", &compat.acct_flags),
            text("sambaLMPassword", &compat.lm_password),
            text("sambaNTPassword", &compat.nt_password),
            text("sambaSID", &compat.security_identifier),
            number("sambaPwdLastSet", compat.pwd_last_set),
            number("sambaPwdCanChange", compat.pwd_can_change),
            number("sambaPwdMustChange", compat.pwd_must_change),
            number("sambaLogonTime", compat.logon_time),
            number("sambaLogoffTime", compat.logoff_time),
            number("sambaKickoffTime", compat.kickoff_time),
            number("sambaBadPasswordCount", compat.bad_password_count),
            number("sambaBadPasswordTime", compat.bad_password_time),
            text("sambaLogonHours", &compat.logon_hours),
        ]);
    }
    attrs
}

/// Modifications that bring an existing entry in line with `attrs`.
///
/// Object classes are only ever added, so auxiliary classes the entry already
/// carries (and their attributes) survive. The add comes first so the new
/// class's attributes are allowed by the time they are replaced.
fn modify_mods(attrs: Vec<Attribute>, rdn: &str, existing_classes: &[String]) -> Vec<Mod<Vec<u8>>> {
    let mut mods = Vec::with_capacity(attrs.len());
    for (name, values) in attrs {
        if name == rdn {
            continue;
        }
        if name == OBJECT_CLASS {
            let missing: HashSet<Vec<u8>> = values
                .into_iter()
                .filter(|class| {
                    !existing_classes
                        .iter()
                        .any(|have| have.as_bytes().eq_ignore_ascii_case(class))
                })
                .collect();
            if !missing.is_empty() {
                mods.insert(0, Mod::Add(OBJECT_CLASS.as_bytes().to_vec(), missing));
            }
            continue;
        }
        mods.push(Mod::Replace(name.as_bytes().to_vec(), values.into_iter().collect()));
    }
    mods
}

fn group_attributes(group: &GroupRecord) -> Vec<Attribute> {
    vec![
        classes(&[GROUP_CLASS]),
        text("cn", &group.name),
        number("gidNumber", group.gid),
        (
            "memberUid",
            group
                .member_usernames
                .iter()
                .map(|m| m.as_bytes().to_vec())
                .collect(),
        ),
    ]
}

fn domain_attributes(domain: &DomainRecord) -> Vec<Attribute> {
    vec![
        classes(&[DOMAIN_CLASS]),
        text("sambaDomainName", &domain.domain_name),
        text("sambaSID", &domain.security_identifier_prefix),
    ]
}

// Attribute names in search results keep the server's spelling.
fn values<'e>(entry: &'e SearchEntry, name: &str) -> &'e [String] {
    entry
        .attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, values)| values.as_slice())
        .unwrap_or_default()
}

fn first<'e>(entry: &'e SearchEntry, name: &str) -> Option<&'e str> {
    values(entry, name).first().map(String::as_str)
}

fn string(entry: &SearchEntry, name: &str) -> String {
    first(entry, name).unwrap_or_default().to_owned()
}

fn binary(entry: &SearchEntry, name: &str) -> Option<Vec<u8>> {
    entry
        .bin_attrs
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first().cloned())
        .or_else(|| first(entry, name).map(|v| v.as_bytes().to_vec()))
}

fn parsed<T>(entry: &SearchEntry, name: &str) -> Result<T, IdentityError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = first(entry, name)
        .with_context(|| format!("{} has no {name}", entry.dn))?;
    Ok(raw
        .parse::<T>()
        .with_context(|| format!("{} has malformed {name} {raw:?}", entry.dn))?)
}

fn parsed_or_zero(entry: &SearchEntry, name: &str) -> Result<i64, IdentityError> {
    match first(entry, name) {
        None => Ok(0),
        Some(_) => parsed(entry, name),
    }
}

fn has_class(entry: &SearchEntry, class: &str) -> bool {
    values(entry, OBJECT_CLASS)
        .iter()
        .any(|c| c.eq_ignore_ascii_case(class))
}

fn user_from_entry(entry: &SearchEntry) -> Result<UserRecord, IdentityError> {
    let compat = if has_class(entry, SAMBA_USER_CLASS) {
        Some(CompatibilityFields {
            domain: string(entry, "sambaDomainName"),
            acct_flags: string(entry, "sambaAcctFlags"),
            lm_password: string(entry, "sambaLMPassword"),
            nt_password: string(entry, "sambaNTPassword"),
            security_identifier: string(entry, "sambaSID"),
            pwd_last_set: parsed_or_zero(entry, "sambaPwdLastSet")?,
            pwd_can_change: parsed_or_zero(entry, "sambaPwdCanChange")?,
            pwd_must_change: parsed_or_zero(entry, "sambaPwdMustChange")?,
            logon_time: parsed_or_zero(entry, "sambaLogonTime")?,
            logoff_time: parsed_or_zero(entry, "sambaLogoffTime")?,
            kickoff_time: parsed_or_zero(entry, "sambaKickoffTime")?,
            bad_password_count: parsed_or_zero(entry, "sambaBadPasswordCount")?,
            bad_password_time: parsed_or_zero(entry, "sambaBadPasswordTime")?,
            logon_hours: string(entry, "sambaLogonHours"),
        })
    } else {
        None
    };
    let password_hash = binary(entry, "userPassword")
        .map(|raw| String::from_utf8_lossy(&raw).into_owned())
        .unwrap_or_default();
    Ok(UserRecord {
        username: string(entry, "uid"),
        uid: parsed(entry, "uidNumber")?,
        gid: parsed(entry, "gidNumber")?,
        first_name: string(entry, "givenName"),
        last_name: string(entry, "sn"),
        full_name: string(entry, "cn"),
        email: string(entry, "mail"),
        phone: string(entry, "telephoneNumber"),
        mobile_phone: first(entry, "mobile").map(str::to_owned),
        photo: binary(entry, "jpegPhoto"),
        gecos: string(entry, "gecos"),
        home_directory: string(entry, "homeDirectory"),
        login_shell: string(entry, "loginShell"),
        password_hash,
        compat,
    })
}

fn group_from_entry(entry: &SearchEntry) -> Result<GroupRecord, IdentityError> {
    Ok(GroupRecord {
        name: string(entry, "cn"),
        gid: parsed(entry, "gidNumber")?,
        member_usernames: values(entry, "memberUid").iter().cloned().collect(),
    })
}

fn domain_from_entry(entry: &SearchEntry) -> DomainRecord {
    DomainRecord {
        domain_name: string(entry, "sambaDomainName"),
        security_identifier_prefix: string(entry, "sambaSID"),
    }
}

// ── escaping ─────────────────────────────────────────────────────────────────

/// Escape an attribute value for use inside a DN (RFC 4514).
pub fn escape_dn_value(value: &str) -> String {
    let count = value.chars().count();
    let mut escaped = String::with_capacity(value.len() * 2);
    for (i, ch) in value.chars().enumerate() {
        match ch {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            '\0' => escaped.push_str("\\00"),
            ' ' if i == 0 || i + 1 == count => escaped.push_str("\\20"),
            '#' if i == 0 => escaped.push_str("\\23"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Escape an assertion value for use inside a search filter (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\5c"),
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
