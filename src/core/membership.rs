//! Membership reconciliation: ensure each confidently-matched user is a
//! member of their department's remote team.
//!
//! A fixed pool of workers consumes the classified users; a single
//! collector drains the results channel. Users are routed to workers by
//! hashing their resolved team id, so all updates against one team run
//! on one worker and the remote fetch-modify-write on `persons_list`
//! never races between workers. Outcomes carry no ordering guarantee;
//! every outcome is tagged with its originating user.
//!
//! Per-user failures never escape a worker: they become
//! `MembershipOutcome` records and leave the rest of the batch alone.

use crate::domain::model::{ClassifiedUser, MembershipOutcome, MembershipStatus};
use crate::domain::ports::RemoteClient;
use crate::domain::remote::{team_key, ApiEnvelope, ObjectId, PersonLink, TeamMembersFields, UserFields};
use crate::utils::error::{Result, SyncError};
use serde_json::json;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const DEFAULT_WORKERS: usize = 100;

pub struct MembershipReconciler<R: RemoteClient + 'static> {
    client: Arc<R>,
    workers: usize,
}

impl<R: RemoteClient + 'static> MembershipReconciler<R> {
    pub fn new(client: Arc<R>, workers: usize) -> Self {
        Self {
            client,
            workers: workers.max(1),
        }
    }

    /// Reconcile every user against the read-only team map. Returns one
    /// outcome per input user, in no particular order.
    pub async fn reconcile(
        &self,
        users: Vec<ClassifiedUser>,
        team_map: HashMap<String, String>,
    ) -> Vec<MembershipOutcome> {
        let expected = users.len();
        let team_map = Arc::new(team_map);
        let workers = self.workers.min(expected.max(1));

        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<MembershipOutcome>();

        let mut queues = Vec::with_capacity(workers);
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let (tx, mut rx) = mpsc::unbounded_channel::<ClassifiedUser>();
            let client = Arc::clone(&self.client);
            let team_map = Arc::clone(&team_map);
            let result_tx = result_tx.clone();
            handles.push(tokio::spawn(async move {
                while let Some(user) = rx.recv().await {
                    let outcome = sync_user(client.as_ref(), &team_map, user).await;
                    if result_tx.send(outcome).is_err() {
                        break;
                    }
                }
            }));
            queues.push(tx);
        }
        drop(result_tx);

        // All work is enqueued up front; routing by team keeps users of
        // the same team on the same worker.
        for user in users {
            let key = routing_key(&user, &team_map);
            let index = worker_index(&key, workers);
            if queues[index].send(user).is_err() {
                tracing::warn!("Membership worker {} exited early", index);
            }
        }
        drop(queues);

        let mut outcomes = Vec::with_capacity(expected);
        while let Some(outcome) = result_rx.recv().await {
            outcomes.push(outcome);
        }
        for handle in handles {
            let _ = handle.await;
        }

        if outcomes.len() != expected {
            tracing::warn!(
                "Collected {} outcomes for {} eligible users",
                outcomes.len(),
                expected
            );
        }
        outcomes
    }
}

fn routing_key(user: &ClassifiedUser, team_map: &HashMap<String, String>) -> String {
    let department = user.matched.as_deref().unwrap_or("");
    team_map
        .get(department)
        .cloned()
        .unwrap_or_else(|| department.to_string())
}

fn worker_index(key: &str, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % workers as u64) as usize
}

async fn sync_user<R: RemoteClient>(
    client: &R,
    team_map: &HashMap<String, String>,
    user: ClassifiedUser,
) -> MembershipOutcome {
    let department = user.matched.clone().unwrap_or_default();
    tracing::info!(
        "Processing user: {} ({}) - Department: {}",
        user.user.cn,
        user.user.email,
        department
    );

    let Some(team_id) = team_map.get(&department).cloned() else {
        return MembershipOutcome {
            user: user.user,
            team_id: None,
            status: MembershipStatus::NoTeamMapping { department },
        };
    };

    let status = match sync_to_team(client, &user, &team_id).await {
        Ok(status) => status,
        Err(e) => MembershipStatus::RemoteCallFailed {
            cause: e.to_string(),
        },
    };
    MembershipOutcome {
        user: user.user,
        team_id: Some(team_id),
        status,
    }
}

async fn sync_to_team<R: RemoteClient>(
    client: &R,
    user: &ClassifiedUser,
    team_id: &str,
) -> Result<MembershipStatus> {
    let Some(person_id) = lookup_person_id(client, &user.user.account_name).await? else {
        return Ok(MembershipStatus::UserNotFound);
    };

    let mut members = fetch_members(client, team_id).await?;
    if members.iter().any(|p| p.person_id.as_str() == person_id) {
        tracing::debug!("{} already in Team::{}", user.user.cn, team_id);
        return Ok(MembershipStatus::AlreadyMember);
    }

    members.push(PersonLink {
        person_id: ObjectId(person_id.clone()),
        role_id: ObjectId("0".to_string()),
    });
    update_members(client, user, team_id, &person_id, members).await
}

/// Resolve a directory login to a remote person id. The login lands
/// inside a quoted OQL literal, so backslashes and quotes are escaped
/// before interpolation.
async fn lookup_person_id<R: RemoteClient>(client: &R, login: &str) -> Result<Option<String>> {
    if login.trim().is_empty() {
        return Ok(None);
    }
    let escaped = login.replace('\\', "\\\\").replace('"', "\\\"");
    let params = json!({
        "class": "User",
        "key": format!("SELECT User WHERE login=\"{}\"", escaped),
        "output_fields": "contactid,login,email",
    });
    let bytes = client.request("core/get", params).await?;
    let envelope: ApiEnvelope<UserFields> = ApiEnvelope::parse("core/get", &bytes)?;
    envelope.ensure_ok("core/get")?;
    Ok(envelope
        .into_fields()
        .into_iter()
        .next()
        .map(|f| f.contact_id.0)
        .filter(|id| !id.is_empty()))
}

async fn fetch_members<R: RemoteClient>(client: &R, team_id: &str) -> Result<Vec<PersonLink>> {
    let params = json!({
        "class": "Team",
        "key": team_id,
        "output_fields": "persons_list",
    });
    let bytes = client.request("core/get", params).await?;
    let mut envelope: ApiEnvelope<TeamMembersFields> = ApiEnvelope::parse("core/get", &bytes)?;
    envelope.ensure_ok("core/get")?;
    envelope
        .take_object(&team_key(team_id))
        .map(TeamMembersFields::into_members)
        .ok_or_else(|| SyncError::MalformedResponse {
            operation: "core/get".to_string(),
            detail: format!("response lacks {}", team_key(team_id)),
        })
}

/// Issue the full-list replace and confirm the new member against the
/// echoed membership list. `code != 0`, or an echo without the new id,
/// is `UpdateNotConfirmed` even though the HTTP call succeeded.
async fn update_members<R: RemoteClient>(
    client: &R,
    user: &ClassifiedUser,
    team_id: &str,
    person_id: &str,
    members: Vec<PersonLink>,
) -> Result<MembershipStatus> {
    let params = json!({
        "class": "Team",
        "key": team_id,
        "comment": format!(
            "Adding Person::{} ({}) to Team::{}",
            person_id, user.user.cn, team_id
        ),
        "fields": { "persons_list": members },
    });
    let bytes = client.request("core/update", params).await?;
    let mut envelope: ApiEnvelope<TeamMembersFields> = ApiEnvelope::parse("core/update", &bytes)?;

    if envelope.code != 0 {
        return Ok(MembershipStatus::UpdateNotConfirmed {
            message: envelope.message,
        });
    }
    let confirmed = envelope
        .take_object(&team_key(team_id))
        .map(TeamMembersFields::into_members)
        .map(|echoed| echoed.iter().any(|p| p.person_id.as_str() == person_id))
        .unwrap_or(false);
    if confirmed {
        Ok(MembershipStatus::Success)
    } else {
        Ok(MembershipStatus::UpdateNotConfirmed {
            message: envelope.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DirectoryUser;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Remote double backed by a single team membership list. Records
    /// every call with its params for call-count and query assertions.
    struct ScriptedRemote {
        calls: Mutex<Vec<(String, serde_json::Value)>>,
        team_id: String,
        members: Mutex<Vec<String>>,
        known_logins: Vec<(String, String)>,
        echo_new_member: bool,
        update_code: i64,
        fail_all: bool,
    }

    impl ScriptedRemote {
        fn new(team_id: &str, members: &[&str], logins: &[(&str, &str)]) -> Self {
            Self {
                calls: Mutex::new(vec![]),
                team_id: team_id.to_string(),
                members: Mutex::new(members.iter().map(|s| s.to_string()).collect()),
                known_logins: logins
                    .iter()
                    .map(|(l, id)| (l.to_string(), id.to_string()))
                    .collect(),
                echo_new_member: true,
                update_code: 0,
                fail_all: false,
            }
        }

        fn without_echo(mut self) -> Self {
            self.echo_new_member = false;
            self
        }

        fn rejecting_updates(mut self, code: i64) -> Self {
            self.update_code = code;
            self
        }

        fn failing(mut self) -> Self {
            self.fail_all = true;
            self
        }

        fn call_count(&self, operation: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(op, _)| op == operation)
                .count()
        }

        fn user_lookup_keys(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(op, params)| op == "core/get" && params["class"] == "User")
                .map(|(_, params)| params["key"].as_str().unwrap_or("").to_string())
                .collect()
        }

        fn members_body(&self, members: &[String], code: i64) -> Vec<u8> {
            let list: Vec<serde_json::Value> = members
                .iter()
                .map(|id| json!({"person_id": id, "role_id": "0"}))
                .collect();
            serde_json::to_vec(&json!({
                "objects": {
                    format!("Team::{}", self.team_id): {"fields": {"persons_list": list}},
                },
                "message": if code == 0 { "" } else { "rejected" },
                "code": code,
            }))
            .unwrap()
        }
    }

    #[async_trait]
    impl RemoteClient for ScriptedRemote {
        async fn request(&self, operation: &str, params: serde_json::Value) -> Result<Vec<u8>> {
            self.calls
                .lock()
                .unwrap()
                .push((operation.to_string(), params.clone()));
            if self.fail_all {
                return Err(SyncError::HttpStatus {
                    operation: operation.to_string(),
                    status: 502,
                });
            }
            match operation {
                "core/get" if params["class"] == "User" => {
                    let key = params["key"].as_str().unwrap_or("");
                    let found = self
                        .known_logins
                        .iter()
                        .find(|(login, _)| key.contains(&format!("login=\"{}\"", login)));
                    match found {
                        Some((login, id)) => Ok(serde_json::to_vec(&json!({
                            "objects": {
                                format!("User::{}", id): {"fields": {"contactid": id, "login": login}},
                            },
                            "message": "",
                            "code": 0,
                        }))?),
                        None => Ok(br#"{"objects":null,"message":"","code":0}"#.to_vec()),
                    }
                }
                "core/get" => {
                    let members = self.members.lock().unwrap().clone();
                    Ok(self.members_body(&members, 0))
                }
                "core/update" => {
                    let sent: Vec<String> = params["fields"]["persons_list"]
                        .as_array()
                        .unwrap()
                        .iter()
                        .map(|p| p["person_id"].as_str().unwrap().to_string())
                        .collect();
                    let mut members = self.members.lock().unwrap();
                    *members = sent.clone();
                    let echoed = if self.echo_new_member {
                        sent
                    } else {
                        Vec::new()
                    };
                    Ok(self.members_body(&echoed, self.update_code))
                }
                other => panic!("unexpected operation {}", other),
            }
        }
    }

    fn matched_user(cn: &str, login: &str, department: &str) -> ClassifiedUser {
        ClassifiedUser {
            user: DirectoryUser {
                cn: cn.to_string(),
                email: format!("{}@example.com", login),
                account_name: login.to_string(),
                department: department.to_string(),
            },
            matched: Some(department.to_string()),
            best_guess: department.to_string(),
            confidence: 1.0,
        }
    }

    fn team_map(department: &str, team_id: &str) -> HashMap<String, String> {
        HashMap::from([(department.to_string(), team_id.to_string())])
    }

    #[tokio::test]
    async fn adds_missing_member_and_confirms_echo() {
        let remote = Arc::new(ScriptedRemote::new("42", &[], &[("alice", "7")]));
        let reconciler = MembershipReconciler::new(remote.clone(), 4);

        let outcomes = reconciler
            .reconcile(
                vec![matched_user("Alice", "alice", "Engineering")],
                team_map("Engineering", "42"),
            )
            .await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status, MembershipStatus::Success);
        assert_eq!(outcomes[0].team_id.as_deref(), Some("42"));
        assert_eq!(remote.call_count("core/update"), 1);
    }

    #[tokio::test]
    async fn existing_member_never_triggers_update() {
        let remote = Arc::new(ScriptedRemote::new("42", &["7"], &[("alice", "7")]));
        let reconciler = MembershipReconciler::new(remote.clone(), 4);

        let outcomes = reconciler
            .reconcile(
                vec![matched_user("Alice", "alice", "Engineering")],
                team_map("Engineering", "42"),
            )
            .await;

        assert_eq!(outcomes[0].status, MembershipStatus::AlreadyMember);
        assert!(outcomes[0].is_success());
        assert_eq!(remote.call_count("core/update"), 0);
    }

    #[tokio::test]
    async fn missing_mapping_makes_no_remote_call() {
        let remote = Arc::new(ScriptedRemote::new("42", &[], &[]));
        let reconciler = MembershipReconciler::new(remote.clone(), 4);

        let outcomes = reconciler
            .reconcile(
                vec![matched_user("Alice", "alice", "Engineering")],
                HashMap::new(),
            )
            .await;

        assert_eq!(
            outcomes[0].status,
            MembershipStatus::NoTeamMapping {
                department: "Engineering".to_string()
            }
        );
        assert_eq!(outcomes[0].team_id, None);
        assert_eq!(remote.call_count("core/get"), 0);
        assert_eq!(remote.call_count("core/update"), 0);
    }

    #[tokio::test]
    async fn unknown_login_is_user_not_found() {
        let remote = Arc::new(ScriptedRemote::new("42", &[], &[]));
        let reconciler = MembershipReconciler::new(remote.clone(), 4);

        let outcomes = reconciler
            .reconcile(
                vec![matched_user("Alice", "alice", "Engineering")],
                team_map("Engineering", "42"),
            )
            .await;

        assert_eq!(outcomes[0].status, MembershipStatus::UserNotFound);
        assert_eq!(remote.call_count("core/update"), 0);
    }

    #[tokio::test]
    async fn quoted_login_is_escaped_in_the_lookup_query() {
        let remote = Arc::new(ScriptedRemote::new("42", &[], &[]));
        let reconciler = MembershipReconciler::new(remote.clone(), 4);

        let outcomes = reconciler
            .reconcile(
                vec![matched_user("Alice", r#"ali"ce"#, "Engineering")],
                team_map("Engineering", "42"),
            )
            .await;

        assert_eq!(outcomes[0].status, MembershipStatus::UserNotFound);
        let keys = remote.user_lookup_keys();
        assert_eq!(keys.len(), 1);
        assert!(
            keys[0].contains(r#"login="ali\"ce""#),
            "quote left unescaped in: {}",
            keys[0]
        );
    }

    #[tokio::test]
    async fn empty_login_is_user_not_found_without_lookup() {
        let remote = Arc::new(ScriptedRemote::new("42", &[], &[]));
        let reconciler = MembershipReconciler::new(remote.clone(), 4);

        let outcomes = reconciler
            .reconcile(
                vec![matched_user("Alice", "", "Engineering")],
                team_map("Engineering", "42"),
            )
            .await;

        assert_eq!(outcomes[0].status, MembershipStatus::UserNotFound);
        assert_eq!(remote.call_count("core/get"), 0);
    }

    #[tokio::test]
    async fn silent_rejection_is_update_not_confirmed() {
        let remote = Arc::new(ScriptedRemote::new("42", &[], &[("alice", "7")]).without_echo());
        let reconciler = MembershipReconciler::new(remote.clone(), 4);

        let outcomes = reconciler
            .reconcile(
                vec![matched_user("Alice", "alice", "Engineering")],
                team_map("Engineering", "42"),
            )
            .await;

        assert!(matches!(
            outcomes[0].status,
            MembershipStatus::UpdateNotConfirmed { .. }
        ));
        assert!(!outcomes[0].is_success());
    }

    #[tokio::test]
    async fn rejected_update_code_is_update_not_confirmed() {
        let remote =
            Arc::new(ScriptedRemote::new("42", &[], &[("alice", "7")]).rejecting_updates(100));
        let reconciler = MembershipReconciler::new(remote, 4);

        let outcomes = reconciler
            .reconcile(
                vec![matched_user("Alice", "alice", "Engineering")],
                team_map("Engineering", "42"),
            )
            .await;

        assert_eq!(
            outcomes[0].status,
            MembershipStatus::UpdateNotConfirmed {
                message: "rejected".to_string()
            }
        );
    }

    #[tokio::test]
    async fn transport_failure_is_isolated_per_user() {
        let remote = Arc::new(ScriptedRemote::new("42", &[], &[("alice", "7")]).failing());
        let reconciler = MembershipReconciler::new(remote, 4);

        let outcomes = reconciler
            .reconcile(
                vec![matched_user("Alice", "alice", "Engineering")],
                team_map("Engineering", "42"),
            )
            .await;

        match &outcomes[0].status {
            MembershipStatus::RemoteCallFailed { cause } => {
                assert!(cause.contains("502"));
            }
            other => panic!("unexpected status: {}", other),
        }
    }

    #[tokio::test]
    async fn every_user_yields_exactly_one_outcome() {
        let remote = Arc::new(ScriptedRemote::new(
            "42",
            &["7"],
            &[("alice", "7"), ("bob", "8"), ("carol", "9")],
        ));
        let reconciler = MembershipReconciler::new(remote, 2);

        let users = vec![
            matched_user("Alice", "alice", "Engineering"),
            matched_user("Bob", "bob", "Engineering"),
            matched_user("Carol", "carol", "Engineering"),
            matched_user("Dave", "dave", "Unmapped"),
        ];
        let outcomes = reconciler
            .reconcile(users, team_map("Engineering", "42"))
            .await;

        assert_eq!(outcomes.len(), 4);
        let names: Vec<&str> = outcomes.iter().map(|o| o.user.cn.as_str()).collect();
        for expected in ["Alice", "Bob", "Carol", "Dave"] {
            assert!(names.contains(&expected), "missing outcome for {}", expected);
        }
    }

    #[test]
    fn same_team_routes_to_same_worker() {
        let map = team_map("Engineering", "42");
        let a = worker_index(&routing_key(&matched_user("A", "a", "Engineering"), &map), 8);
        let b = worker_index(&routing_key(&matched_user("B", "b", "Engineering"), &map), 8);
        assert_eq!(a, b);
        assert!(a < 8);
    }
}
