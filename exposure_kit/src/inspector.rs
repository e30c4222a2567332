//! Volume inspection
//!
//! Decides whether a workload's volumes mount a host path containing the
//! target substring.

use crate::model::{ExposureVerdict, MountEvidence, ResourceKind, Volume};

/// Default target: the Docker runtime control socket
pub const DEFAULT_TARGET: &str = "docker.sock";

/// Return the first host path volume whose path contains `target`
///
/// Matching is a literal, case-sensitive substring test. Volumes without a
/// host path source are skipped.
pub fn inspect_volumes(volumes: &[Volume], target: &str) -> Option<MountEvidence> {
    volumes.iter().enumerate().find_map(|(index, volume)| {
        let host_path = volume.host_path.as_ref()?;
        host_path.path.contains(target).then(|| MountEvidence {
            index,
            volume: volume.name.clone(),
            path: host_path.path.clone(),
        })
    })
}

/// Build the verdict for one workload
pub fn inspect(
    namespace: &str,
    kind: ResourceKind,
    name: &str,
    volumes: &[Volume],
    target: &str,
) -> ExposureVerdict {
    let evidence = inspect_volumes(volumes, target);
    if let Some(found) = &evidence {
        log::info!(
            "{}/{} {} mounts {} via volume '{}'",
            namespace,
            name,
            kind,
            found.path,
            found.volume
        );
    }

    ExposureVerdict {
        namespace: namespace.to_string(),
        kind,
        name: name.to_string(),
        mounted: evidence.is_some(),
        evidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ControllerKind;

    #[test]
    fn test_short_circuits_on_first_match() {
        let volumes = vec![
            Volume::host_path("logs", "/var/log"),
            Volume::host_path("sock", "/run/docker.sock"),
            Volume::host_path("etc", "/etc"),
        ];

        let evidence = inspect_volumes(&volumes, DEFAULT_TARGET).unwrap();
        assert_eq!(evidence.index, 1);
        assert_eq!(evidence.volume, "sock");
        assert_eq!(evidence.path, "/run/docker.sock");
    }

    #[test]
    fn test_reports_first_of_several_matches() {
        let volumes = vec![
            Volume::host_path("a", "/var/run/docker.sock"),
            Volume::host_path("b", "/run/docker.sock"),
        ];
        assert_eq!(inspect_volumes(&volumes, DEFAULT_TARGET).unwrap().index, 0);
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let volumes = vec![Volume::host_path("sock", "/run/DOCKER.SOCK")];
        assert!(inspect_volumes(&volumes, DEFAULT_TARGET).is_none());
    }

    #[test]
    fn test_non_host_path_volumes_are_skipped() {
        // The volume name mentions the target but has no host path source
        let volumes = vec![Volume::empty_dir("docker.sock"), Volume::empty_dir("cache")];
        assert!(inspect_volumes(&volumes, DEFAULT_TARGET).is_none());
        assert!(inspect_volumes(&[], DEFAULT_TARGET).is_none());
    }

    #[test]
    fn test_custom_target() {
        let volumes = vec![Volume::host_path("crio", "/var/run/crio/crio.sock")];
        assert!(inspect_volumes(&volumes, DEFAULT_TARGET).is_none());
        assert!(inspect_volumes(&volumes, "crio.sock").is_some());
    }

    #[test]
    fn test_inspect_builds_verdict() {
        let kind = ResourceKind::Controller(ControllerKind::DaemonSet);
        let mounted = inspect(
            "monitoring",
            kind,
            "node-exporter",
            &[Volume::host_path("sock", "/var/run/docker.sock")],
            DEFAULT_TARGET,
        );
        assert!(mounted.mounted);
        assert_eq!(mounted.status(), "mounted");
        assert_eq!(mounted.namespace, "monitoring");
        assert_eq!(mounted.kind, kind);

        let clean = inspect("monitoring", kind, "node-exporter", &[], DEFAULT_TARGET);
        assert!(!clean.mounted);
        assert!(clean.evidence.is_none());
        assert_eq!(clean.status(), "not-mounted");
    }
}
