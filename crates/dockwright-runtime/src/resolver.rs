//! Image id recovery from build logs.
//!
//! Builders do not print a machine-readable result, so the id is scraped
//! from completion markers. The modern builder's markers live in
//! [`BUILDKIT_RULES`]; supporting a new builder release means adding a row
//! there. Logs are always scanned newest line first because earlier lines
//! may carry superseded ids under the same marker.

use dockwright_common::constants::{
    BUILDKIT_ENV, BUILDKIT_ENV_DEFAULT, MARKER_CACHE_ONLY, MARKER_EXPORTING_CONFIG,
    MARKER_LEGACY_BUILT, MARKER_MANIFEST_LIST, MARKER_WRITING_IMAGE,
};
use dockwright_common::error::{DockwrightError, Result};
use dockwright_common::types::{ImageId, ProcessResult};

use crate::command::CommandBuilder;
use crate::process::{Invocation, ProcessRunner};

/// What a matching marker means for the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// The first word after the marker is the image digest.
    Digest,
    /// The marker proves the build legitimately produced no local image.
    ToleratedEmpty,
}

/// One recognized line shape of the modern builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRule {
    /// Substring to look for, matched case-sensitively.
    pub marker: &'static str,
    /// How a match is interpreted.
    pub kind: RuleKind,
}

/// Modern builder markers. Digest rules are tried in order before any
/// tolerated-empty rule is consulted.
pub const BUILDKIT_RULES: &[MarkerRule] = &[
    MarkerRule {
        marker: MARKER_WRITING_IMAGE,
        kind: RuleKind::Digest,
    },
    MarkerRule {
        marker: MARKER_EXPORTING_CONFIG,
        kind: RuleKind::Digest,
    },
    // multi-platform build, nothing single to point at
    MarkerRule {
        marker: MARKER_MANIFEST_LIST,
        kind: RuleKind::ToleratedEmpty,
    },
    // no --load
    MarkerRule {
        marker: MARKER_CACHE_ONLY,
        kind: RuleKind::ToleratedEmpty,
    },
];

/// First word following the most recent occurrence of `marker`.
///
/// Lines are searched from the end. A line where the marker is the last
/// thing printed is skipped. The builder appends a status token such as
/// `done` after the id, which is why the first word is taken rather than
/// the last.
#[must_use]
pub fn word_after<'a>(logs: &'a str, marker: &str) -> Option<&'a str> {
    logs.lines().rev().find_map(|line| {
        let (_, rest) = line.rsplit_once(marker)?;
        rest.split_whitespace().next()
    })
}

/// Drops an `<algorithm>:` prefix, keeping only the digest.
#[must_use]
pub fn strip_algorithm(id: &str) -> &str {
    id.rsplit(':').next().unwrap_or(id)
}

/// Whether the result was produced with the modern builder enabled.
#[must_use]
pub fn buildkit_enabled(result: &ProcessResult) -> bool {
    result.env_var(BUILDKIT_ENV).unwrap_or(BUILDKIT_ENV_DEFAULT) == "1"
}

/// Applies [`BUILDKIT_RULES`] to a modern builder log.
///
/// Returns `None` when neither a digest nor a tolerated-empty marker is
/// present, which usually means the builder's output format changed.
#[must_use]
pub fn scan_buildkit_log(logs: &str) -> Option<ImageId> {
    let digest = BUILDKIT_RULES
        .iter()
        .filter(|rule| rule.kind == RuleKind::Digest)
        .find_map(|rule| {
            let id = strip_algorithm(word_after(logs, rule.marker)?);
            (!id.is_empty()).then(|| {
                tracing::debug!(marker = rule.marker, id, "image id found");
                id
            })
        });
    if let Some(id) = digest {
        return Some(ImageId::new(id));
    }

    let tolerated = BUILDKIT_RULES
        .iter()
        .filter(|rule| rule.kind == RuleKind::ToleratedEmpty)
        .find(|rule| logs.contains(rule.marker));
    if let Some(rule) = tolerated {
        tracing::debug!(marker = rule.marker, "build produced no local image");
        return Some(ImageId::unresolved());
    }
    None
}

fn unresolved(result: &ProcessResult, reason: String) -> DockwrightError {
    DockwrightError::ImageIdUnresolved {
        reason,
        result: Box::new(result.clone()),
    }
}

/// Resolves the image id of a finished build.
///
/// A nonzero exit yields the empty id without looking at the log. Legacy
/// builds print only a short id, which is expanded through `inspect`.
///
/// # Errors
///
/// Returns [`DockwrightError::ImageIdUnresolved`] when a successful build's
/// log has no usable marker, or any error from the `inspect` invocation.
pub fn resolve_image_id(
    result: &ProcessResult,
    runner: &dyn ProcessRunner,
    commands: &CommandBuilder,
) -> Result<ImageId> {
    if result.exit_code != 0 {
        return Ok(ImageId::unresolved());
    }
    if buildkit_enabled(result) {
        return scan_buildkit_log(&result.logs).ok_or_else(|| {
            let markers: Vec<_> = BUILDKIT_RULES.iter().map(|r| r.marker).collect();
            unresolved(
                result,
                format!("build succeeded but none of {markers:?} appeared in its log"),
            )
        });
    }

    let short = word_after(&result.logs, MARKER_LEGACY_BUILT).ok_or_else(|| {
        unresolved(
            result,
            format!("legacy build log has no {MARKER_LEGACY_BUILT:?} line"),
        )
    })?;
    tracing::debug!(short_id = short, "expanding legacy image id");

    let inspect = runner.execute(&Invocation::new(commands.inspect_id_command(short)))?;
    let long = strip_algorithm(inspect.text());
    if long.is_empty() {
        return Err(unresolved(result, format!("inspect printed no id for {short}")));
    }
    Ok(ImageId::new(long))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use dockwright_common::types::ExpectedExit;

    use super::*;
    use crate::testing::{Reply, ScriptedRunner};

    const SINGLE_PLATFORM: &str = "\
#1 [internal] load build definition from Dockerfile
#1 transferring dockerfile: 37B done
#1 DONE 0.0s

#5 [1/1] FROM docker.io/library/alpine
#5 CACHED

#6 exporting to image
#6 exporting layers done
#6 writing image sha256:0d5f2a6ae4b0f6cfa6b93bb8ac1f1a4ec8a0e5f0c3b6f1e9a7d2c4b8e6f1a3c5 done
#6 naming to docker.io/library/app:latest done
#6 DONE 0.0s
";

    const MULTI_PLATFORM_NO_LOAD: &str = "\
#9 exporting to image
#9 exporting layers done
#9 exporting manifest sha256:1111 done
#9 exporting_manifest_list sha256:2222 done
#9 DONE 0.3s
";

    const CACHE_ONLY: &str = "\
WARNING: No output specified with docker-container driver. Build result will only remain in the build cache. To push result image into registry use --push or to load image into docker use --load
#1 [internal] booting buildkit
#1 DONE 1.2s
";

    fn built(exit_code: i32, logs: &str, buildkit: Option<&str>) -> ProcessResult {
        let mut env = BTreeMap::new();
        if let Some(value) = buildkit {
            let _ = env.insert(BUILDKIT_ENV.to_string(), value.to_string());
        }
        ProcessResult {
            argv: vec!["docker".into(), "build".into(), ".".into()],
            exit_code,
            stdout: String::new(),
            stderr: logs.into(),
            logs: logs.into(),
            env,
            timed_out: false,
            expected: ExpectedExit::Success,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn first_word_after_marker_not_trailing_status() {
        let id = scan_buildkit_log("... writing image sha256:deadbeef done").unwrap();
        assert_eq!(id.as_str(), "deadbeef");
    }

    #[test]
    fn captured_single_platform_log() {
        let id = scan_buildkit_log(SINGLE_PLATFORM).unwrap();
        assert_eq!(
            id.as_str(),
            "0d5f2a6ae4b0f6cfa6b93bb8ac1f1a4ec8a0e5f0c3b6f1e9a7d2c4b8e6f1a3c5"
        );
    }

    #[test]
    fn most_recent_marker_wins() {
        let logs = "writing image sha256:old done\nstep\nwriting image sha256:new done\n";
        assert_eq!(scan_buildkit_log(logs).unwrap().as_str(), "new");
    }

    #[test]
    fn exporting_config_fallback() {
        let logs = "#7 exporting config sha256:c0ffee done\n#7 DONE\n";
        assert_eq!(scan_buildkit_log(logs).unwrap().as_str(), "c0ffee");
    }

    #[test]
    fn writing_image_preferred_over_exporting_config() {
        let logs = "writing image sha256:aaa done\nexporting config sha256:bbb done\n";
        assert_eq!(scan_buildkit_log(logs).unwrap().as_str(), "aaa");
    }

    #[test]
    fn manifest_list_is_tolerated_empty() {
        assert!(scan_buildkit_log(MULTI_PLATFORM_NO_LOAD).unwrap().is_unresolved());
    }

    #[test]
    fn cache_only_is_tolerated_empty() {
        assert!(scan_buildkit_log(CACHE_ONLY).unwrap().is_unresolved());
    }

    #[test]
    fn unknown_log_is_hard_failure() {
        assert!(scan_buildkit_log("#1 DONE 0.0s\n").is_none());
    }

    #[test]
    fn bare_marker_line_is_skipped() {
        let logs = "writing image sha256:abc done\nwriting image\n";
        assert_eq!(word_after(logs, "writing image"), Some("sha256:abc"));
    }

    #[test]
    fn markers_are_case_sensitive() {
        assert!(scan_buildkit_log("WRITING IMAGE sha256:abc done\n").is_none());
    }

    #[test]
    fn strip_algorithm_keeps_bare_ids() {
        assert_eq!(strip_algorithm("sha256:abc"), "abc");
        assert_eq!(strip_algorithm("abc"), "abc");
    }

    #[test]
    fn buildkit_defaults_to_enabled() {
        assert!(buildkit_enabled(&built(0, "", None)));
        assert!(buildkit_enabled(&built(0, "", Some("1"))));
        assert!(!buildkit_enabled(&built(0, "", Some("0"))));
    }

    #[test]
    fn nonzero_exit_skips_scanning() {
        let runner = ScriptedRunner::new([]);
        let id = resolve_image_id(
            &built(1, "garbage without markers", None),
            &runner,
            &CommandBuilder::default(),
        )
        .unwrap();
        assert!(id.is_unresolved());
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn legacy_short_id_is_expanded() {
        let runner = ScriptedRunner::new([Reply::exit(0).stdout("sha256:abc123ffff\n")]);
        let result = built(0, "Step 1/1 : FROM alpine\nSuccessfully built abc123\n", Some("0"));
        let id = resolve_image_id(&result, &runner, &CommandBuilder::default()).unwrap();
        assert_eq!(id.as_str(), "abc123ffff");
        assert_eq!(
            runner.calls()[0].argv,
            vec!["docker", "inspect", "abc123", "--format", "{{ .ID }}"]
        );
    }

    #[test]
    fn legacy_without_marker_fails() {
        let runner = ScriptedRunner::new([]);
        let err = resolve_image_id(&built(0, "Step 1/1\n", Some("0")), &runner, &CommandBuilder::default())
            .unwrap_err();
        assert!(matches!(err, DockwrightError::ImageIdUnresolved { .. }));
        assert_eq!(err.process_result().map(|r| r.logs.as_str()), Some("Step 1/1\n"));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn legacy_inspect_failure_propagates() {
        let runner = ScriptedRunner::new([Reply::exit(1).stderr("No such object: abc123\n")]);
        let result = built(0, "Successfully built abc123\n", Some("0"));
        let err = resolve_image_id(&result, &runner, &CommandBuilder::default()).unwrap_err();
        assert!(matches!(err, DockwrightError::UnexpectedExitCode { .. }));
    }
}
