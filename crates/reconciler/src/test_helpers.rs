//! In-memory Mealie server for reconciler tests.

use async_trait::async_trait;
use groupwarden_core::{GatewayError, Group, GroupGateway, SelfGroup, User};
use std::collections::HashSet;
use std::sync::Mutex;

/// A mutation the reconciler issued against the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateGroup(String),
    UpdateUser { username: String, group: String },
}

#[derive(Default)]
struct State {
    groups: Vec<Group>,
    users: Vec<User>,
    self_group: String,
    next_id: u32,
    mutations: Vec<Mutation>,
    list_group_calls: usize,
    fail_list_groups: bool,
    fail_list_members: bool,
    fail_self_group: bool,
    unlisted: HashSet<String>,
    fail_update_for: HashSet<String>,
    mismatch_for: HashSet<String>,
    conflict_on_create: HashSet<String>,
}

/// Fake server. Members listing returns every user it knows about.
pub struct FakeMealie {
    state: Mutex<State>,
}

impl FakeMealie {
    pub fn new(self_group: &str) -> Self {
        let fake = Self {
            state: Mutex::new(State {
                self_group: self_group.into(),
                ..State::default()
            }),
        };
        fake.add_group(self_group);
        fake
    }

    pub fn add_group(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        insert_group(&mut state, name);
    }

    pub fn add_user(&self, username: &str, group: &str) {
        let mut state = self.state.lock().unwrap();
        let mut extra = serde_json::Map::new();
        extra.insert("email".into(), format!("{username}@example.com").into());
        extra.insert("admin".into(), false.into());
        state.users.push(User {
            id: format!("u-{username}"),
            username: username.into(),
            group: Some(group.into()),
            extra,
        });
    }

    pub fn set_self_group(&self, name: &str) {
        self.state.lock().unwrap().self_group = name.into();
    }

    pub fn fail_list_groups(&self, fail: bool) {
        self.state.lock().unwrap().fail_list_groups = fail;
    }

    pub fn fail_list_members(&self, fail: bool) {
        self.state.lock().unwrap().fail_list_members = fail;
    }

    pub fn fail_self_group(&self, fail: bool) {
        self.state.lock().unwrap().fail_self_group = fail;
    }

    /// Keep `name` out of group listings even after it is created.
    pub fn unlist_group(&self, name: &str) {
        self.state.lock().unwrap().unlisted.insert(name.into());
    }

    pub fn fail_update_for(&self, username: &str) {
        self.state.lock().unwrap().fail_update_for.insert(username.into());
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.fail_list_groups = false;
        state.fail_list_members = false;
        state.fail_self_group = false;
        state.fail_update_for.clear();
        state.mismatch_for.clear();
    }

    /// The update call for `username` succeeds but reports the old group.
    pub fn mismatch_for(&self, username: &str) {
        self.state.lock().unwrap().mismatch_for.insert(username.into());
    }

    /// Creating `name` fails with a conflict, as if someone else created it first.
    pub fn conflict_on_create(&self, name: &str) {
        self.state.lock().unwrap().conflict_on_create.insert(name.into());
    }

    pub fn user(&self, username: &str) -> Option<User> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }

    pub fn user_group(&self, username: &str) -> Option<String> {
        self.user(username).and_then(|u| u.group)
    }

    pub fn group_count(&self) -> usize {
        self.state.lock().unwrap().groups.len()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.state.lock().unwrap().groups.iter().any(|g| g.name == name)
    }

    pub fn mutations(&self) -> Vec<Mutation> {
        self.state.lock().unwrap().mutations.clone()
    }

    pub fn list_group_calls(&self) -> usize {
        self.state.lock().unwrap().list_group_calls
    }
}

fn insert_group(state: &mut State, name: &str) -> Group {
    state.next_id += 1;
    let group = Group {
        id: format!("g-{}", state.next_id),
        name: name.into(),
        slug: None,
    };
    state.groups.push(group.clone());
    group
}

#[async_trait]
impl GroupGateway for FakeMealie {
    async fn list_groups(&self) -> Result<Vec<Group>, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.list_group_calls += 1;
        if state.fail_list_groups {
            return Err(GatewayError::Network("connection refused".into()));
        }
        Ok(state
            .groups
            .iter()
            .filter(|g| !state.unlisted.contains(&g.name))
            .cloned()
            .collect())
    }

    async fn create_group(&self, name: &str) -> Result<Group, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.conflict_on_create.remove(name) {
            insert_group(&mut state, name);
            return Err(GatewayError::Conflict(format!("{name} already exists")));
        }
        if state.groups.iter().any(|g| g.name == name) {
            return Err(GatewayError::Conflict(format!("{name} already exists")));
        }
        state.mutations.push(Mutation::CreateGroup(name.into()));
        Ok(insert_group(&mut state, name))
    }

    async fn list_members(&self) -> Result<Vec<User>, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.fail_list_members {
            return Err(GatewayError::Network("connection reset".into()));
        }
        Ok(state.users.clone())
    }

    async fn self_group(&self) -> Result<SelfGroup, GatewayError> {
        let state = self.state.lock().unwrap();
        if state.fail_self_group {
            return Err(GatewayError::AuthenticationFailed("token expired".into()));
        }
        Ok(SelfGroup {
            name: state.self_group.clone(),
        })
    }

    async fn update_user(&self, user: &User) -> Result<User, GatewayError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_update_for.contains(&user.username) {
            return Err(GatewayError::ApiError {
                status_code: 502,
                message: "Bad Gateway".into(),
            });
        }

        let group = user.group.clone().unwrap_or_default();
        state.mutations.push(Mutation::UpdateUser {
            username: user.username.clone(),
            group,
        });

        let mismatch = state.mismatch_for.contains(&user.username);
        let stored = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| GatewayError::ApiError {
                status_code: 404,
                message: format!("user {} not found", user.id),
            })?;

        if mismatch {
            return Ok(stored.clone());
        }
        *stored = user.clone();
        Ok(stored.clone())
    }
}
