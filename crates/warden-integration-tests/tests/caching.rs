//! Caching realm behavior seen through the security manager.

use std::sync::Arc;
use std::time::Duration;

use warden::{SecurityManager, SubjectContext};
use warden_cache::{Cache, MemoryCache};
use warden_core::Principal;
use warden_realm::{AuthorizingRealm, CachedInfo, CachingRealm, Realm};
use warden_test::{CountingRealm, USERS_INI, test_token};

fn cached_manager() -> (Arc<CountingRealm>, Arc<SecurityManager>) {
    let backing = Arc::new(CountingRealm::from_ini("users", USERS_INI));
    let cache: Arc<dyn Cache<CachedInfo>> = Arc::new(MemoryCache::<CachedInfo>::new());
    let caching = CachingRealm::new(Arc::clone(&backing) as Arc<dyn AuthorizingRealm>, cache);
    let manager = SecurityManager::builder().realm(Arc::new(caching)).build();
    (backing, manager)
}

#[test]
fn test_repeated_logins_hit_the_backing_realm_once() {
    let (backing, manager) = cached_manager();

    for _ in 0..3 {
        let subject = manager.create_subject(SubjectContext::new()).unwrap();
        subject.login(&test_token("foo", "password")).unwrap();
    }
    assert_eq!(backing.authentication_calls(), 1);
}

#[test]
fn test_wrong_password_is_checked_against_cached_info() {
    let (backing, manager) = cached_manager();
    let subject = manager.create_subject(SubjectContext::new()).unwrap();

    subject.login(&test_token("foo", "password")).unwrap();
    assert!(subject.login(&test_token("foo", "wrong")).is_err());
    assert_eq!(backing.authentication_calls(), 1);
}

#[test]
fn test_permission_checks_are_cached_and_logout_evicts() {
    let (backing, manager) = cached_manager();
    let subject = manager.create_subject(SubjectContext::new()).unwrap();
    subject.login(&test_token("foo", "password")).unwrap();

    assert!(subject.is_permitted_str("write:report"));
    assert!(subject.has_role("manager"));
    assert!(!subject.is_permitted_str("read:report"));
    assert_eq!(backing.authorization_calls(), 1);

    subject.logout();
    subject.login(&test_token("foo", "password")).unwrap();
    assert!(subject.is_permitted_str("write:report"));
    assert_eq!(backing.authentication_calls(), 2);
    assert_eq!(backing.authorization_calls(), 2);
}

#[test]
fn test_logout_evicts_assumed_principals() {
    let backing = Arc::new(CountingRealm::from_ini("users", USERS_INI));
    let caching = Arc::new(CachingRealm::with_memory_cache(
        Arc::clone(&backing) as Arc<dyn AuthorizingRealm>
    ));
    let manager = SecurityManager::builder()
        .realm(Arc::clone(&caching) as Arc<dyn Realm>)
        .build();

    let subject = manager.create_subject(SubjectContext::new()).unwrap();
    subject.login(&test_token("foo", "password")).unwrap();
    subject.run_as(vec![Principal::name("bar")]).unwrap();
    assert!(subject.is_permitted_str("read:public"));
    assert_eq!(backing.authorization_calls(), 1);

    subject.logout();
    caching.authorization_info(&[Principal::name("bar")]).unwrap();
    assert_eq!(backing.authorization_calls(), 2);
}

#[test]
fn test_unknown_accounts_are_not_cached_by_default() {
    let (backing, manager) = cached_manager();

    for _ in 0..2 {
        assert!(manager.authenticate(&test_token("nobody", "x")).is_err());
    }
    assert_eq!(backing.authentication_calls(), 2);
}

#[test]
fn test_negative_caching_is_opt_in() {
    let backing = Arc::new(CountingRealm::from_ini("users", USERS_INI));
    let caching = CachingRealm::with_memory_cache(Arc::clone(&backing) as Arc<dyn AuthorizingRealm>)
        .with_negative_caching(Duration::from_secs(60));

    for _ in 0..2 {
        assert!(caching.authentication_info(&test_token("nobody", "x")).is_err());
    }
    assert_eq!(backing.authentication_calls(), 1);
}

#[test]
fn test_expired_entries_reach_the_backing_realm_again() {
    let backing = Arc::new(CountingRealm::from_ini("users", USERS_INI));
    let caching = CachingRealm::with_memory_cache(Arc::clone(&backing) as Arc<dyn AuthorizingRealm>)
        .with_authorization_ttl(Duration::from_millis(20));
    let principals = [Principal::name("foo")];

    caching.authorization_info(&principals).unwrap();
    std::thread::sleep(Duration::from_millis(60));
    caching.authorization_info(&principals).unwrap();
    assert_eq!(backing.authorization_calls(), 2);
}
