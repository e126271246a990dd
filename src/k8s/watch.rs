//! Feed cluster change events into the control loop

use futures::StreamExt;
use k8s_openapi::api::admissionregistration::v1::{
    MutatingWebhookConfiguration, ValidatingWebhookConfiguration,
};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret, Service, ServiceAccount};
use k8s_openapi::api::networking::v1::Ingress;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use k8s_openapi::kube_aggregator::pkg::apis::apiregistration::v1::APIService;
use kube::runtime::watcher::{self, Event};
use kube::runtime::WatchStreamExt;
use kube::{Api, Client, Resource};
use orphanage_cluster::ResourceKind;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::controller::ClusterEvent;
use crate::policy::{OrphanagePolicy, PolicyKey};

/// Start one watch per policy and resource kind, forwarding changes to
/// `sender`. Tasks end when the receiving side is dropped.
pub fn spawn_event_feed(
    client: Client,
    sender: mpsc::Sender<ClusterEvent>,
) -> Vec<JoinHandle<()>> {
    let mut tasks = vec![tokio::spawn(watch_policies(
        Api::all(client.clone()),
        sender.clone(),
    ))];

    for kind in ResourceKind::ALL {
        let client = client.clone();
        let sender = sender.clone();
        let task = match kind {
            ResourceKind::Secret => spawn_watch::<Secret>(client, kind, sender),
            ResourceKind::ConfigMap => spawn_watch::<ConfigMap>(client, kind, sender),
            ResourceKind::Service => spawn_watch::<Service>(client, kind, sender),
            ResourceKind::Pod => spawn_watch::<Pod>(client, kind, sender),
            ResourceKind::Deployment => spawn_watch::<Deployment>(client, kind, sender),
            ResourceKind::StatefulSet => spawn_watch::<StatefulSet>(client, kind, sender),
            ResourceKind::DaemonSet => spawn_watch::<DaemonSet>(client, kind, sender),
            ResourceKind::ReplicaSet => spawn_watch::<ReplicaSet>(client, kind, sender),
            ResourceKind::Job => spawn_watch::<Job>(client, kind, sender),
            ResourceKind::CronJob => spawn_watch::<CronJob>(client, kind, sender),
            ResourceKind::Ingress => spawn_watch::<Ingress>(client, kind, sender),
            ResourceKind::ServiceAccount => spawn_watch::<ServiceAccount>(client, kind, sender),
            ResourceKind::ValidatingWebhookConfiguration => {
                spawn_watch::<ValidatingWebhookConfiguration>(client, kind, sender)
            }
            ResourceKind::MutatingWebhookConfiguration => {
                spawn_watch::<MutatingWebhookConfiguration>(client, kind, sender)
            }
            ResourceKind::ApiService => spawn_watch::<APIService>(client, kind, sender),
            ResourceKind::CustomResourceDefinition => {
                spawn_watch::<CustomResourceDefinition>(client, kind, sender)
            }
        };
        tasks.push(task);
    }

    tasks
}

fn spawn_watch<K>(
    client: Client,
    kind: ResourceKind,
    sender: mpsc::Sender<ClusterEvent>,
) -> JoinHandle<()>
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    tokio::spawn(watch_kind(Api::<K>::all(client), kind, sender))
}

/// The event a watch event of `kind` turns into.
///
/// Objects replayed during the initial list are skipped; the end of a
/// (re)list is reported once so changes missed while disconnected are
/// picked up.
fn resource_event<K>(kind: ResourceKind, event: &Event<K>) -> Option<ClusterEvent> {
    match event {
        Event::Apply(_) | Event::Delete(_) | Event::InitDone => Some(ClusterEvent::resource(kind)),
        Event::Init | Event::InitApply(_) => None,
    }
}

/// Spec generation last seen per policy.
///
/// Status writes do not bump `metadata.generation`, so an update that
/// leaves `(uid, generation)` unchanged is the controller's own status
/// publish coming back and does not trigger another pass.
#[derive(Debug, Default)]
struct PolicyGenerations {
    seen: HashMap<PolicyKey, (Option<String>, Option<i64>)>,
}

impl PolicyGenerations {
    fn event(&mut self, event: Event<OrphanagePolicy>) -> Option<ClusterEvent> {
        match event {
            Event::Apply(policy) | Event::InitApply(policy) => {
                let key = policy.key()?;
                let version = (policy.metadata.uid.clone(), policy.metadata.generation);
                if version.1.is_some() && self.seen.get(&key) == Some(&version) {
                    debug!(policy = %key, "status-only update, skipping");
                    return None;
                }
                self.seen.insert(key.clone(), version);
                Some(ClusterEvent::policy_changed(key))
            }
            Event::Delete(policy) => {
                let key = policy.key()?;
                self.seen.remove(&key);
                Some(ClusterEvent::policy_deleted(key))
            }
            Event::Init | Event::InitDone => None,
        }
    }
}

async fn watch_kind<K>(api: Api<K>, kind: ResourceKind, sender: mpsc::Sender<ClusterEvent>)
where
    K: Resource + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
    K::DynamicType: Default,
{
    let mut stream = watcher::watcher(api, watcher::Config::default())
        .default_backoff()
        .boxed();

    while let Some(event) = stream.next().await {
        match event {
            Ok(event) => {
                if let Some(event) = resource_event(kind, &event) {
                    if sender.send(event).await.is_err() {
                        debug!(%kind, "Event receiver closed, stopping watch");
                        return;
                    }
                }
            }
            Err(e) => warn!(%kind, "Watch error: {e}"),
        }
    }
}

async fn watch_policies(api: Api<OrphanagePolicy>, sender: mpsc::Sender<ClusterEvent>) {
    let mut stream = watcher::watcher(api, watcher::Config::default())
        .default_backoff()
        .boxed();
    let mut generations = PolicyGenerations::default();

    while let Some(event) = stream.next().await {
        match event {
            Ok(event) => {
                if let Some(event) = generations.event(event) {
                    if sender.send(event).await.is_err() {
                        debug!("Event receiver closed, stopping policy watch");
                        return;
                    }
                }
            }
            Err(e) => warn!("Policy watch error: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::new_policy;

    #[test]
    fn test_initial_list_is_reported_once() {
        let secret = Secret::default();
        let kind = ResourceKind::Secret;

        assert_eq!(resource_event(kind, &Event::InitApply(secret.clone())), None);
        assert_eq!(resource_event::<Secret>(kind, &Event::Init), None);
        assert_eq!(
            resource_event::<Secret>(kind, &Event::InitDone),
            Some(ClusterEvent::resource(kind))
        );
        assert_eq!(
            resource_event(kind, &Event::Delete(secret)),
            Some(ClusterEvent::resource(kind))
        );
    }

    fn versioned(name: &str, uid: &str, generation: i64) -> OrphanagePolicy {
        let mut policy = new_policy("team-a", name, &["Secret"]);
        policy.metadata.uid = Some(uid.to_string());
        policy.metadata.generation = Some(generation);
        policy
    }

    #[test]
    fn test_policy_events_carry_keys() {
        let key = PolicyKey::new("team-a", "audit");
        let mut generations = PolicyGenerations::default();

        assert_eq!(
            generations.event(Event::Apply(new_policy("team-a", "audit", &["Secret"]))),
            Some(ClusterEvent::policy_changed(key.clone()))
        );
        assert_eq!(
            generations.event(Event::Delete(new_policy("team-a", "audit", &[]))),
            Some(ClusterEvent::policy_deleted(key))
        );
        assert_eq!(generations.event(Event::InitDone), None);
    }

    #[test]
    fn test_status_only_updates_are_skipped() {
        let key = PolicyKey::new("team-a", "audit");
        let mut generations = PolicyGenerations::default();

        assert_eq!(
            generations.event(Event::InitApply(versioned("audit", "u1", 1))),
            Some(ClusterEvent::policy_changed(key.clone()))
        );

        // Our own status write: same uid and generation.
        let mut published = versioned("audit", "u1", 1);
        published.status = Some(Default::default());
        assert_eq!(generations.event(Event::Apply(published)), None);

        assert_eq!(
            generations.event(Event::Apply(versioned("audit", "u1", 2))),
            Some(ClusterEvent::policy_changed(key.clone()))
        );

        // Recreated under the same name.
        assert_eq!(
            generations.event(Event::Apply(versioned("audit", "u2", 2))),
            Some(ClusterEvent::policy_changed(key))
        );
    }
}
