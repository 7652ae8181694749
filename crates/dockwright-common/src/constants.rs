//! Engine names, environment variables, and build-log markers.
//!
//! The marker strings are matched byte-for-byte against builder output and
//! must not be reformatted.

/// Default container engine binary.
pub const DEFAULT_ENGINE_BINARY: &str = "docker";

/// Subcommand that routes `build` through the multi-platform builder.
pub const DEFAULT_MULTI_ARCH_SUBCOMMAND: &str = "buildx";

/// Environment variable toggling the modern builder (`"1"` or `"0"`).
pub const BUILDKIT_ENV: &str = "DOCKER_BUILDKIT";

/// Value of [`BUILDKIT_ENV`] assumed when the overlay does not set it.
pub const BUILDKIT_ENV_DEFAULT: &str = "1";

/// Format expression selecting the canonical image or container id.
pub const ID_FORMAT: &str = "{{ .ID }}";

/// Modern builder: the image was written to the local store.
pub const MARKER_WRITING_IMAGE: &str = "writing image";

/// Modern builder: the image config was exported (older builder releases).
pub const MARKER_EXPORTING_CONFIG: &str = "exporting config";

/// Modern builder: a multi-platform manifest list was exported.
pub const MARKER_MANIFEST_LIST: &str = "exporting_manifest_list";

/// Modern builder: no `--load`, so the result never reached the image store.
pub const MARKER_CACHE_ONLY: &str = "Build result will only remain in the build cache";

/// Legacy builder completion line, followed by the short image id.
pub const MARKER_LEGACY_BUILT: &str = "Successfully built";

/// Exit code recorded for processes killed on timeout or by a signal.
pub const KILLED_EXIT_CODE: i32 = -1;

/// Application name used in CLI output.
pub const APP_NAME: &str = "dockwright";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "dwr";

/// Environment variable overriding the engine binary in the CLI.
pub const ENGINE_ENV: &str = "DWR_ENGINE";

/// Environment variable pointing the CLI at a JSON config file.
pub const CONFIG_ENV: &str = "DWR_CONFIG";
