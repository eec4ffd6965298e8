//! Login, permission checks and logout against an INI realm.

use warden::{LoginError, SecurityManager, SubjectContext};
use warden_authz::Permission;
use warden_core::Principal;
use warden_test::{init_test_logging, test_security_manager, test_token};

#[test]
fn test_ini_login_grants_role_permissions_until_logout() {
    init_test_logging();
    let manager = test_security_manager();
    let subject = manager.create_subject(SubjectContext::new()).unwrap();

    assert!(!subject.is_authenticated());
    assert!(!subject.is_permitted_str("write:anything"));

    subject.login(&test_token("foo", "password")).unwrap();
    assert!(subject.is_authenticated());
    assert_eq!(subject.principal(), Some(Principal::name("foo")));
    assert!(subject.has_role("manager"));
    assert!(subject.is_permitted_str("write:anything"));
    assert!(!subject.is_permitted_str("read:anything"));

    subject.logout();
    assert!(!subject.is_authenticated());
    assert!(subject.principals().is_empty());
    assert!(!subject.is_permitted_str("write:anything"));
    assert!(!subject.is_permitted_str("read:anything"));
}

#[test]
fn test_rejected_logins_look_alike() {
    let manager = test_security_manager();
    let subject = manager.create_subject(SubjectContext::new()).unwrap();

    assert_eq!(
        subject.login(&test_token("foo", "wrong")),
        Err(LoginError::AuthenticationFailed)
    );
    assert_eq!(
        subject.login(&test_token("nobody", "password")),
        Err(LoginError::AuthenticationFailed)
    );
    assert!(!subject.is_authenticated());
}

#[test]
fn test_wildcard_role_grants_everything() {
    let manager = test_security_manager();
    let subject = manager.create_subject(SubjectContext::new()).unwrap();
    subject.login(&test_token("admin", "secret")).unwrap();

    assert!(subject.is_permitted(&Permission::All));
    assert!(subject.is_permitted_str("printer:print:lp7200"));
    assert!(!subject.has_role("manager"));
}

#[test]
fn test_guest_permissions_are_scoped() {
    let manager = test_security_manager();
    let subject = manager.create_subject(SubjectContext::new()).unwrap();
    subject.login(&test_token("bar", "password2")).unwrap();

    assert!(subject.is_permitted_str("read:public"));
    assert!(!subject.is_permitted_str("read:private"));
    assert!(!subject.is_permitted_str("write:public"));
}

#[test]
fn test_manager_without_realms_is_misconfigured() {
    let manager = SecurityManager::builder().build();
    let subject = manager.create_subject(SubjectContext::new()).unwrap();

    assert_eq!(
        subject.login(&test_token("foo", "password")),
        Err(LoginError::Misconfigured)
    );
}

#[test]
fn test_foreign_subject_is_rejected() {
    let first = test_security_manager();
    let second = test_security_manager();
    let subject = first.create_subject(SubjectContext::new()).unwrap();

    let err = second
        .login(&subject, &test_token("foo", "password"))
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(!subject.is_authenticated());
}

#[test]
fn test_subject_display() {
    let manager = test_security_manager();
    let subject = manager.create_subject(SubjectContext::new()).unwrap();
    subject.login(&test_token("foo", "password")).unwrap();
    assert_eq!(subject.to_string(), "Subject[foo](true)");
}

#[test]
fn test_remembered_identity_is_not_authenticated() {
    let manager = test_security_manager();
    let subject = manager
        .create_subject(SubjectContext::new().with_principals(vec![Principal::name("foo")], false))
        .unwrap();

    assert!(subject.is_remembered());
    assert!(!subject.is_authenticated());
    assert!(subject.has_role("manager"));
}
