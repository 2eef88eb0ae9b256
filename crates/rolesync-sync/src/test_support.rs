//! Shared manifests for unit tests

/// Deployment plus Service, the common shape of a role manifest
pub const DEPLOYMENT_WITH_SERVICE: &str = r#"---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: test-app-server
  labels:
    project: some-project
    role: some-role
spec:
  replicas: 2
  template:
    metadata:
      labels:
        project: some-project
        role: some-role
    spec:
      containers:
      - name: some-project
        image: docker-registry.example.com/some-project:latest
        resources:
          limits:
            cpu: 500m
            memory: 100Mi
---
apiVersion: v1
kind: Service
metadata:
  name: some-project
  labels:
    project: some-project
    role: some-role
spec:
  ports:
  - port: 80
    targetPort: 4242
"#;

/// A batch job without a service
pub const JOB: &str = r#"---
apiVersion: batch/v1
kind: Job
metadata:
  name: job-role
spec:
  template:
    spec:
      restartPolicy: Never
      containers:
      - name: job
        image: docker-registry.example.com/job:latest
"#;

/// The deployment document on its own
pub fn deployment_only() -> String {
    let mut parts = DEPLOYMENT_WITH_SERVICE.split("\n---\n");
    parts.next().unwrap_or_default().to_string()
}

/// The same manifest rendered as a JSON array
pub fn as_json(yaml: &str) -> String {
    let docs = rolesync_core::parse_documents("manifest.yml", yaml).unwrap();
    serde_json::to_string(&docs).unwrap()
}
