//! Realm loaded from INI-style text.
//!
//! ```text
//! [users]
//! # username = password, role1, role2, ...
//! foo = password, manager
//!
//! [roles]
//! # role = permission, permission, ...
//! manager = write:*, manage:*
//! ```
//!
//! Blank lines and lines starting with `#` or `;` are ignored, as are keys in
//! other sections.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use warden_authc::{AuthenticationInfo, AuthenticationToken, CredentialsMatcher, SimpleAccount};
use warden_authz::{AuthorizationInfo, Authorizer, Permission, SimpleRole};
use warden_core::Principal;

use crate::{AuthorizingRealm, Realm, RealmError, RealmResult, SimpleAccountRealm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Users,
    Roles,
    Other,
}

/// A [`SimpleAccountRealm`] populated from `[users]` and `[roles]` sections.
pub struct IniRealm {
    inner: SimpleAccountRealm,
}

impl IniRealm {
    /// Build a realm from INI text.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Parse`] for malformed lines,
    /// [`RealmError::MissingPassword`] for a user without a password,
    /// [`RealmError::EmptyRole`] for a role without permissions, and
    /// [`RealmError::InvalidPermission`] for a malformed permission.
    pub fn parse(name: impl Into<String>, text: &str) -> RealmResult<Self> {
        let inner = SimpleAccountRealm::new(name);
        let mut section = Section::None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index.saturating_add(1);
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let header = header.strip_suffix(']').ok_or_else(|| RealmError::Parse {
                    line: line_no,
                    message: format!("unterminated section header '{line}'"),
                })?;
                section = match header.trim().to_ascii_lowercase().as_str() {
                    "users" => Section::Users,
                    "roles" => Section::Roles,
                    _ => Section::Other,
                };
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| RealmError::Parse {
                line: line_no,
                message: "expected 'key = value'".to_string(),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(RealmError::Parse {
                    line: line_no,
                    message: "empty key".to_string(),
                });
            }

            match section {
                Section::Users => inner.add_account(parse_user(inner.name(), key, value)?),
                Section::Roles => inner.add_role(parse_role(key, value)?),
                Section::None | Section::Other => {},
            }
        }

        tracing::debug!(
            realm = %inner.name(),
            users = inner.account_count(),
            roles = inner.role_count(),
            "Loaded INI realm"
        );

        Ok(Self { inner })
    }

    /// Build a realm from an INI file.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Io`] if the file cannot be read, otherwise the
    /// errors of [`IniRealm::parse`].
    pub fn load(name: impl Into<String>, path: &Path) -> RealmResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| RealmError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(name, &text)
    }

    /// Use a different credentials matcher.
    #[must_use]
    pub fn with_credentials_matcher(self, matcher: Arc<dyn CredentialsMatcher>) -> Self {
        Self {
            inner: self.inner.with_credentials_matcher(matcher),
        }
    }

    /// The underlying account realm.
    #[must_use]
    pub fn accounts(&self) -> &SimpleAccountRealm {
        &self.inner
    }
}

fn parse_user(realm: &str, user: &str, value: &str) -> RealmResult<SimpleAccount> {
    let mut fields = value.split(',').map(str::trim);
    let password = fields.next().filter(|p| !p.is_empty()).ok_or_else(|| {
        RealmError::MissingPassword {
            user: user.to_string(),
        }
    })?;

    let mut account = SimpleAccount::new(user, password.as_bytes().to_vec(), realm);
    for role in fields.filter(|r| !r.is_empty()) {
        account.add_role(role);
    }
    Ok(account)
}

fn parse_role(name: &str, value: &str) -> RealmResult<SimpleRole> {
    let mut role = SimpleRole::new(name);
    for entry in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let permission =
            Permission::parse(entry).map_err(|source| RealmError::InvalidPermission {
                role: name.to_string(),
                source,
            })?;
        role.add_permission(permission);
    }

    if role.permissions().is_empty() {
        return Err(RealmError::EmptyRole {
            role: name.to_string(),
        });
    }
    Ok(role)
}

impl Realm for IniRealm {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn supports(&self, token: &dyn AuthenticationToken) -> bool {
        self.inner.supports(token)
    }

    fn authentication_info(
        &self,
        token: &dyn AuthenticationToken,
    ) -> RealmResult<Arc<dyn AuthenticationInfo>> {
        self.inner.authentication_info(token)
    }

    fn credentials_matcher(&self) -> Option<&dyn CredentialsMatcher> {
        self.inner.credentials_matcher()
    }

    fn as_authorizing(&self) -> Option<&dyn AuthorizingRealm> {
        Some(self)
    }

    fn as_authorizer(&self) -> Option<&dyn Authorizer> {
        Some(self)
    }
}

impl AuthorizingRealm for IniRealm {
    fn authorization_info(
        &self,
        principals: &[Principal],
    ) -> RealmResult<Arc<dyn AuthorizationInfo>> {
        self.inner.authorization_info(principals)
    }
}

impl Authorizer for IniRealm {
    fn has_role(&self, principals: &[Principal], role: &str) -> bool {
        self.inner.has_role(principals, role)
    }

    fn is_permitted(&self, principals: &[Principal], permission: &Permission) -> bool {
        self.inner.is_permitted(principals, permission)
    }
}

impl fmt::Display for IniRealm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IniRealm: {} users, {} roles",
            self.inner.account_count(),
            self.inner.role_count()
        )
    }
}

impl fmt::Debug for IniRealm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IniRealm").field(&self.inner).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use warden_authc::UsernamePasswordToken;

    const USERS: &str = "\
[users]
foo = password, manager
bar = password2, admin,     agroup,manager
baz=pwd
[roles]
admin = *
agroup= read:*
manager = write:*, manage:*
";

    fn principals(name: &str) -> Vec<Principal> {
        vec![Principal::name(name)]
    }

    #[test]
    fn test_parse_users_and_roles() {
        let realm = IniRealm::parse("ini", USERS).unwrap();
        assert_eq!(realm.name(), "ini");
        assert_eq!(realm.to_string(), "IniRealm: 3 users, 3 roles");

        let info = realm
            .authentication_info(&UsernamePasswordToken::new("bar", ""))
            .unwrap();
        assert_eq!(info.credentials(), b"password2");

        assert!(realm.has_role(&principals("bar"), "agroup"));
        assert!(realm.has_role(&principals("bar"), "manager"));
        assert!(!realm.has_role(&principals("baz"), "manager"));
    }

    #[test]
    fn test_role_permissions() {
        let realm = IniRealm::parse("ini", USERS).unwrap();
        assert!(realm.is_permitted_str(&principals("foo"), "write:anything"));
        assert!(!realm.is_permitted_str(&principals("foo"), "read:anything"));
        assert!(realm.is_permitted_str(&principals("bar"), "read:anything"));
        assert!(realm.is_permitted_str(&principals("bar"), "delete:everything"));
        assert!(!realm.is_permitted_str(&principals("baz"), "read:anything"));
    }

    #[test]
    fn test_comments_and_other_sections_are_ignored() {
        let text = "\
# leading comment
stray = ignored
[main]
securityManager = something
[users]
; another comment
foo2 = password
";
        let realm = IniRealm::parse("ini2", text).unwrap();
        assert!(realm.accounts().has_account(&Principal::name("foo2")));
        assert_eq!(realm.accounts().account_count(), 1);
    }

    #[test]
    fn test_user_without_password_fails() {
        let err = IniRealm::parse("bad", "[users]\nfoo = , admin\n").err().unwrap();
        assert!(matches!(err, RealmError::MissingPassword { user } if user == "foo"));
    }

    #[test]
    fn test_role_without_permissions_fails() {
        let err = IniRealm::parse("bad", "[roles]\nempty = , ,\n").err().unwrap();
        assert!(matches!(err, RealmError::EmptyRole { role } if role == "empty"));
    }

    #[test]
    fn test_invalid_permission_fails() {
        let err = IniRealm::parse("bad", "[roles]\nbroken = a::b\n").err().unwrap();
        assert!(matches!(err, RealmError::InvalidPermission { .. }));
    }

    #[test]
    fn test_malformed_lines_report_line_numbers() {
        let err = IniRealm::parse("bad", "[users]\nfoo = pw\njust text\n").err().unwrap();
        assert!(matches!(err, RealmError::Parse { line: 3, .. }));

        let err = IniRealm::parse("bad", "[users\n").err().unwrap();
        assert!(matches!(err, RealmError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(USERS.as_bytes()).unwrap();

        let realm = IniRealm::load("file", file.path()).unwrap();
        assert_eq!(realm.accounts().account_count(), 3);

        let missing = IniRealm::load("file", Path::new("/nonexistent/warden.ini"));
        assert!(matches!(missing, Err(RealmError::Io { .. })));
    }
}
