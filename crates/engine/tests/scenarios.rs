//! End-to-end behaviour: catalog, replace, login snapshot, gate

use std::collections::BTreeSet;
use std::sync::Arc;

use capability::Session;
use engine::{AccessControl, CatalogSeed, MemoryStore, RequestContext};
use rbac::AccessStore;
use shared::{
    AccessError, AuditSettings, EngineConfig, ErrorKind, NewPrincipal, NewRole, PermissionId,
    RoleId, UnknownPermissionsError,
};

fn ids(raw: &[u64]) -> Vec<PermissionId> {
    raw.iter().copied().map(PermissionId::new).collect()
}

fn empty_engine() -> AccessControl {
    AccessControl::new(Arc::new(MemoryStore::new()), &AuditSettings::default())
}

/// users.{view,edit,delete} as permission ids 1..=3 and roles 1..=5
fn five_roles() -> AccessControl {
    let seed: CatalogSeed = serde_yaml::from_str(
        r#"
modules:
  - { code: users, title: Users }
actions:
  - { code: view, title: View }
  - { code: edit, title: Edit }
  - { code: delete, title: Delete }
permissions:
  - { module: users, action: view }
  - { module: users, action: edit }
  - { module: users, action: delete }
roles:
  - { name: admin }
  - { name: viewer }
  - { name: auditor }
  - { name: guest }
  - { name: editor }
"#,
    )
    .unwrap();

    let engine = empty_engine();
    engine.apply_seed(&seed).unwrap();
    engine
}

#[test]
fn scenario_a_editor_snapshot() {
    let engine = five_roles();
    let editor = engine.roles().find_role_by_name("editor").unwrap().unwrap();
    engine
        .replace_role_permissions_by_keys(editor.id, &["users.view", "users.edit"])
        .unwrap();
    let alice = engine
        .principals()
        .create_principal(NewPrincipal::new("alice", Some(editor.id)))
        .unwrap();

    let response = engine.login(alice.id).unwrap();
    let wire = serde_json::to_string(&response).unwrap();
    let session = Session::from_json(&wire).unwrap();

    let expected: BTreeSet<String> = ["users.edit", "users.view"]
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(session.permissions(), &expected);
    assert!(!session.can("users", "delete"));
    assert!(session.can("users", "view"));
}

#[test]
fn scenario_b_replace_swaps_set() {
    let engine = five_roles();
    let role = RoleId::new(5);
    engine.replace_role_permissions(role, &ids(&[1, 2])).unwrap();

    let final_set = engine.replace_role_permissions(role, &ids(&[2, 3])).unwrap();

    assert_eq!(final_set, ids(&[2, 3]));
    assert_eq!(
        engine.store().assigned_permission_ids(role).unwrap(),
        ids(&[2, 3])
    );
}

#[test]
fn scenario_c_unknown_id_changes_nothing() {
    let engine = five_roles();
    let role = RoleId::new(5);
    engine.replace_role_permissions(role, &ids(&[1, 2])).unwrap();

    let err = engine
        .replace_role_permissions(role, &ids(&[2, 3, 999]))
        .unwrap_err();

    assert_eq!(
        err,
        AccessError::UnknownPermissions(UnknownPermissionsError {
            role_id: 5,
            unknown_ids: vec![999],
        })
    );
    assert_eq!(err.status_code(), 422);
    assert_eq!(
        engine.assignments().role_permission_ids(role).unwrap(),
        ids(&[1, 2])
    );
}

#[test]
fn scenario_d_null_role_always_denied() {
    let engine = five_roles();
    let admin = engine.roles().find_role_by_name("admin").unwrap().unwrap();
    engine
        .replace_role_permissions(admin.id, &ids(&[1, 2, 3]))
        .unwrap();
    let nobody = engine
        .principals()
        .create_principal(NewPrincipal::new("nobody", None))
        .unwrap();

    for action in ["view", "edit", "delete", "export"] {
        let err = engine
            .authorize(&mut RequestContext::for_principal(nobody.id), "users", action)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
    assert!(engine.login(nobody.id).unwrap().access.is_empty());
}

#[test]
fn gate_and_snapshot_agree() {
    let engine = five_roles();
    let role = engine
        .roles()
        .create_role(NewRole::new("partial"))
        .unwrap();
    engine.replace_role_permissions(role.id, &ids(&[1, 3])).unwrap();
    let bob = engine
        .principals()
        .create_principal(NewPrincipal::new("bob", Some(role.id)))
        .unwrap();

    let session = Session::from_login(&engine.login(bob.id).unwrap());

    for action in ["view", "edit", "delete"] {
        let allowed = engine
            .authorize(&mut RequestContext::for_principal(bob.id), "users", action)
            .is_ok();
        assert_eq!(allowed, session.can("users", action), "users.{}", action);
    }
}

#[test]
fn snapshot_is_stale_until_next_login() {
    let engine = five_roles();
    let role = RoleId::new(2);
    engine.replace_role_permissions(role, &ids(&[1])).unwrap();
    let carol = engine
        .principals()
        .create_principal(NewPrincipal::new("carol", Some(role)))
        .unwrap();

    let mut session = Session::from_login(&engine.login(carol.id).unwrap());
    engine.replace_role_permissions(role, &[]).unwrap();

    assert!(session.can("users", "view"));
    assert!(engine
        .authorize(&mut RequestContext::for_principal(carol.id), "users", "view")
        .is_err());

    session.login(&engine.login(carol.id).unwrap());
    assert!(!session.can("users", "view"));
}

#[test]
fn state_survives_save_and_open() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state").join("gatehouse.json");
    let config = EngineConfig::default();

    let engine = AccessControl::open(&state, &config).unwrap();
    engine.apply_seed(&CatalogSeed::example()).unwrap();
    engine.save(&state).unwrap();

    let reopened = AccessControl::open(&state, &config).unwrap();
    let admin = reopened
        .principals()
        .list_principals()
        .unwrap()
        .into_iter()
        .find(|p| p.username == "admin")
        .unwrap();

    reopened
        .authorize(&mut RequestContext::for_principal(admin.id), "zones", "delete")
        .unwrap();
    assert_eq!(reopened.catalog().list_permissions().unwrap().len(), 16);
}

#[test]
fn config_seed_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let seed_path = dir.path().join("seed.yaml");
    std::fs::write(
        &seed_path,
        serde_yaml::to_string(&CatalogSeed::example()).unwrap(),
    )
    .unwrap();
    let config = EngineConfig {
        seed: Some(seed_path),
        ..Default::default()
    };

    let engine = AccessControl::in_memory(&config).unwrap();
    assert_eq!(engine.roles().list_roles().unwrap().len(), 2);
}

#[test]
fn catalog_rename_reaches_gate_and_login() {
    let engine = five_roles();
    let role = RoleId::new(1);
    engine.replace_role_permissions(role, &ids(&[1])).unwrap();
    let dave = engine
        .principals()
        .create_principal(NewPrincipal::new("dave", Some(role)))
        .unwrap();
    let users = engine.catalog().find_module_by_code("users").unwrap().unwrap();

    engine
        .change_catalog("rename module 'users' to 'members'", |c| {
            c.update_module(
                users.id,
                shared::CatalogEntryUpdate {
                    code: Some("members".to_string()),
                    title: None,
                },
            )
        })
        .unwrap();

    assert!(engine
        .authorize(&mut RequestContext::for_principal(dave.id), "members", "view")
        .is_ok());
    assert!(engine
        .authorize(&mut RequestContext::for_principal(dave.id), "users", "view")
        .is_err());
    let session = Session::from_login(&engine.login(dave.id).unwrap());
    assert!(session.can("members", "view"));
}

#[test]
fn concurrent_readers_never_see_partial_replace() {
    let engine = five_roles();
    let role = RoleId::new(5);
    let before = ids(&[1, 2]);
    let after = ids(&[3]);
    engine.replace_role_permissions(role, &before).unwrap();

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..200 {
                let next = if i % 2 == 0 { &after } else { &before };
                engine.replace_role_permissions(role, next).unwrap();
            }
        });
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..200 {
                    let seen = engine.store().assigned_permission_ids(role).unwrap();
                    assert!(seen == before || seen == after, "partial set {:?}", seen);
                }
            });
        }
    });
}
