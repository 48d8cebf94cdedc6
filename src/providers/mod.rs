pub mod env;
pub mod extra_cmd;
pub mod stdin;
pub mod transcript;
pub mod usage;
pub mod vcs;

pub use env::{ConfigCountCollector, FileSystemConfigCounter, StubConfigCountCollector};
pub use extra_cmd::{ExtraCommandCollector, ShellExtraCommand, StubExtraCommand};
pub use stdin::{parse_snapshot, ProcessStdinCollector, StdinCollector, StubStdinCollector};
pub use transcript::{
    FileTranscriptCollector, StubTranscriptCollector, TranscriptCollector, TranscriptParser,
};
pub use usage::{OAuthUsageCollector, StubUsageCollector, UsageCollector};
pub use vcs::{LocalVcsCollector, StubVcsCollector, VcsCollector};
