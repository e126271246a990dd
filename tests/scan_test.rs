use orphanage::{Config, Orphanage};
use orphanage_analyzer::Target;
use orphanage_cluster::{ObjectRef, ResourceKind, TargetKind};
use std::path::Path;
use tempfile::TempDir;

const WORKLOADS: &str = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: app-config
  namespace: shop
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: legacy-config
  namespace: shop
---
apiVersion: v1
kind: Secret
metadata:
  name: db-password
  namespace: shop
---
apiVersion: v1
kind: Secret
metadata:
  name: registry-creds
  namespace: shop
---
apiVersion: v1
kind: Secret
metadata:
  name: shop-tls
  namespace: shop
---
apiVersion: v1
kind: Secret
metadata:
  name: stale-token
  namespace: shop
---
apiVersion: v1
kind: Secret
metadata:
  name: db-password
  namespace: other
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: shop
spec:
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
        - name: web
          image: web:1
          env:
            - name: DB_PASSWORD
              valueFrom:
                secretKeyRef:
                  name: db-password
                  key: password
      volumes:
        - name: config
          configMap:
            name: app-config
---
apiVersion: v1
kind: ServiceAccount
metadata:
  name: builder
  namespace: shop
imagePullSecrets:
  - name: registry-creds
"#;

const INGRESS: &str = r#"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: storefront
  namespace: shop
spec:
  tls:
    - hosts:
        - shop.example.com
      secretName: shop-tls
  rules:
    - host: shop.example.com
      http:
        paths:
          - path: /
            pathType: Prefix
            backend:
              service:
                name: web
                port:
                  number: 80
"#;

fn write_manifests(dir: &Path) {
    std::fs::create_dir(dir.join("apps")).unwrap();
    std::fs::write(dir.join("apps/workloads.yaml"), WORKLOADS).unwrap();
    std::fs::write(dir.join("ingress.yaml"), INGRESS).unwrap();
}

#[tokio::test]
async fn test_scan_finds_only_unreferenced_targets() {
    let temp_dir = TempDir::new().unwrap();
    write_manifests(temp_dir.path());

    let app = Orphanage::new(Config::default());
    let state = Orphanage::manifest_state(temp_dir.path(), &[], "shop").unwrap();

    let report = app
        .scan(state, "shop", &[TargetKind::Secret, TargetKind::ConfigMap])
        .await
        .unwrap();

    let orphans: Vec<String> = report.orphans.iter().map(ToString::to_string).collect();
    assert_eq!(orphans, ["Secret/stale-token", "ConfigMap/legacy-config"]);
    assert_eq!(report.orphan_count, 2);
    assert_eq!(report.targets_evaluated, 6);
}

#[tokio::test]
async fn test_manifest_filters_narrow_the_state() {
    let temp_dir = TempDir::new().unwrap();
    write_manifests(temp_dir.path());

    let app = Orphanage::new(Config::default());
    let state = Orphanage::manifest_state(temp_dir.path(), &["apps/*".to_string()], "shop")
        .unwrap();

    // Without the ingress manifest nothing mounts the TLS secret.
    let report = app.scan(state, "shop", &[TargetKind::Secret]).await.unwrap();
    assert!(report.is_orphaned(TargetKind::Secret, "shop-tls"));
    assert!(report.is_orphaned(TargetKind::Secret, "stale-token"));
    assert_eq!(report.orphan_count, 2);
}

#[tokio::test]
async fn test_repeated_scans_agree() {
    let temp_dir = TempDir::new().unwrap();
    write_manifests(temp_dir.path());

    let app = Orphanage::new(Config::default());
    let state = Orphanage::manifest_state(temp_dir.path(), &[], "shop").unwrap();

    let first = app
        .scan(state.clone(), "shop", &[TargetKind::Secret])
        .await
        .unwrap();
    let second = app.scan(state, "shop", &[TargetKind::Secret]).await.unwrap();

    assert!(first.same_findings(&second));
}

#[tokio::test]
async fn test_references_lists_every_referencing_object() {
    let temp_dir = TempDir::new().unwrap();
    write_manifests(temp_dir.path());

    let app = Orphanage::new(Config::default());
    let state = Orphanage::manifest_state(temp_dir.path(), &[], "shop").unwrap();

    let tls = app
        .references(state.clone(), &Target::new(TargetKind::Secret, "shop", "shop-tls"))
        .await
        .unwrap();
    assert_eq!(
        tls.into_iter().collect::<Vec<_>>(),
        [ObjectRef::namespaced(ResourceKind::Ingress, "shop", "storefront")]
    );

    let service = app
        .references(state.clone(), &Target::new(TargetKind::Service, "shop", "web"))
        .await
        .unwrap();
    assert_eq!(service.len(), 1);

    // Same name, different namespace: nothing in `other` refers to it.
    let elsewhere = app
        .references(state, &Target::new(TargetKind::Secret, "other", "db-password"))
        .await
        .unwrap();
    assert!(elsewhere.is_empty());
}

#[tokio::test]
async fn test_scan_rejects_non_monitorable_kinds() {
    let temp_dir = TempDir::new().unwrap();
    write_manifests(temp_dir.path());

    let app = Orphanage::new(Config::default());
    let state = Orphanage::manifest_state(temp_dir.path(), &[], "shop").unwrap();

    let result = app.scan(state, "shop", &[TargetKind::Service]).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_manifests_without_namespace_land_in_scanned_namespace() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("bare.yaml"),
        r#"
apiVersion: v1
kind: Secret
metadata:
  name: stale-token
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: unused
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: mounted
---
apiVersion: v1
kind: Pod
metadata:
  name: web
spec:
  containers:
    - name: web
      image: web:1
  volumes:
    - name: config
      configMap:
        name: mounted
"#,
    )
    .unwrap();

    let app = Orphanage::new(Config::default());
    let state = Orphanage::manifest_state(temp_dir.path(), &[], "default").unwrap();

    let report = app
        .scan(state, "default", &[TargetKind::Secret, TargetKind::ConfigMap])
        .await
        .unwrap();

    assert_eq!(report.targets_evaluated, 3);
    let orphans: Vec<String> = report.orphans.iter().map(ToString::to_string).collect();
    assert_eq!(orphans, ["Secret/stale-token", "ConfigMap/unused"]);
}
