//! End-to-end tests of the task against a fake MFTECmd.

#[cfg(all(test, unix))]
mod tests {
    use crate::config::{StageConfig, ToolFailurePolicy, ToolSpec};
    use crate::context::{TaskContext, TaskIdentity};
    use crate::core::{
        InputFile, TaskResult, CONFIG_PASSTHROUGH_DATA_TYPE, FILE_COMPLETED_EVENT, FILE_STARTED_EVENT,
        MFTECMD_DATA_TYPE,
    };
    use crate::errors::WorkerError;
    use crate::events::CollectingEventSink;
    use crate::registry::default_registry;
    use crate::task::{MftecmdTask, TaskRequest, TASK_NAME};
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Scratch layout for one run: inputs, outputs and the fake tool.
    struct Harness {
        _root: TempDir,
        inputs_dir: PathBuf,
        output_dir: PathBuf,
        script: PathBuf,
        log: PathBuf,
    }

    impl Harness {
        /// Creates a harness whose tool exits with `exit_code` for inputs
        /// whose path contains `fail_on`, and 0 otherwise.
        fn new(fail_on: Option<&str>, exit_code: i32) -> Self {
            let root = TempDir::new().unwrap();
            let inputs_dir = root.path().join("inputs");
            let output_dir = root.path().join("output");
            std::fs::create_dir(&inputs_dir).unwrap();
            std::fs::create_dir(&output_dir).unwrap();

            let log = root.path().join("argv.log");
            let script = root.path().join("fake-mftecmd.sh");
            let fail_check = fail_on.map_or_else(String::new, |needle| {
                format!("case \"$input\" in *{needle}*) exit {exit_code};; esac\n")
            });
            let body = format!(
                "printf '%s\\n' \"$*\" >> '{log}'\n\
                 input=''\n\
                 out=''\n\
                 while [ $# -gt 0 ]; do\n\
                 case \"$1\" in\n\
                 -f) input=\"$2\"; shift 2;;\n\
                 --csvf) out=\"$2\"; shift 2;;\n\
                 *) shift;;\n\
                 esac\n\
                 done\n\
                 {fail_check}\
                 printf 'EntryNumber,FileName\\n' > \"$out\"\n\
                 exit 0\n",
                log = log.display(),
            );
            std::fs::write(&script, body).unwrap();

            Self {
                _root: root,
                inputs_dir,
                output_dir,
                script,
                log,
            }
        }

        fn ok() -> Self {
            Self::new(None, 0)
        }

        fn input(&self, file: &str, display_name: &str, content: &str) -> InputFile {
            let path = self.inputs_dir.join(file);
            std::fs::write(&path, content).unwrap();
            InputFile::new(path, display_name).with_uuid(format!("id-{file}"))
        }

        fn config(&self) -> StageConfig {
            let tool = ToolSpec::new("/bin/sh").with_entry_args([self.script.display().to_string()]);
            StageConfig::default()
                .with_tool(tool)
                .with_heartbeat_interval(Duration::from_millis(50))
        }

        fn invocations(&self) -> Vec<String> {
            std::fs::read_to_string(&self.log)
                .map(|s| s.lines().map(String::from).collect())
                .unwrap_or_default()
        }

        fn leftover_dirs(&self) -> Vec<PathBuf> {
            std::fs::read_dir(&self.output_dir)
                .unwrap()
                .map(|e| e.unwrap().path())
                .filter(|p| p.is_dir())
                .collect()
        }

        async fn run(&self, config: StageConfig, inputs: Vec<InputFile>) -> Result<TaskResult, WorkerError> {
            let ctx = TaskContext::new(TaskIdentity::new(TASK_NAME));
            let request = TaskRequest::new(&self.output_dir, inputs).with_workflow_id("wf-42");
            MftecmdTask::new(config).execute(&ctx, request).await
        }
    }

    fn names(result: &TaskResult) -> Vec<&str> {
        result.output_files.iter().map(|o| o.display_name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_only_markers_produces_nothing() {
        let h = Harness::ok();
        let inputs = vec![
            h.input("cfg", ".openrelik-config", "hostname: ws-1\n"),
            h.input("marker", ".hostname-marker", "ws-1"),
        ];

        let result = h.run(h.config(), inputs).await.unwrap();

        assert!(result.is_empty());
        assert_eq!(result.command, "");
        assert!(h.invocations().is_empty());
        assert_eq!(std::fs::read_dir(&h.output_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_mft_and_journal_are_correlated() {
        let h = Harness::ok();
        let mft = h.input("mft", "$MFT", "m");
        let journal = h.input("usn", "$J", "j");
        let mft_path = mft.path.display().to_string();

        let result = h.run(h.config(), vec![mft, journal]).await.unwrap();

        assert_eq!(names(&result), vec!["$MFT_MFTECmd_output.csv", "$J_MFTECmd_output.csv"]);
        assert!(result.output_files.iter().all(|o| o.data_type == MFTECMD_DATA_TYPE));
        assert!(result.output_files.iter().all(|o| o.path.exists()));
        assert_eq!(result.workflow_id.as_deref(), Some("wf-42"));
        assert_eq!(result.output_files[1].source_file_id.as_deref(), Some("id-usn"));

        let calls = h.invocations();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].contains(" -m "));
        assert!(calls[1].ends_with(&format!("-m {mft_path}")));
        assert!(result.command.ends_with(&format!("-m {mft_path}")));
        assert!(h.leftover_dirs().is_empty());
    }

    #[tokio::test]
    async fn test_journal_without_mft_is_not_enriched() {
        let h = Harness::ok();
        let result = h
            .run(h.config(), vec![h.input("usn", "$UsnJrnl%3A$J", "j")])
            .await
            .unwrap();

        assert_eq!(names(&result), vec!["$UsnJrnl%3A$J_MFTECmd_output.csv"]);
        assert!(!h.invocations()[0].contains(" -m "));
    }

    #[tokio::test]
    async fn test_plain_marker_prefixes_outputs() {
        let h = Harness::ok();
        let inputs = vec![
            h.input("marker", ".hostname-marker", "HOST-01\n"),
            h.input("mft", "$MFT", "m"),
            h.input("log", "$LogFile", "l"),
        ];

        let result = h.run(h.config(), inputs).await.unwrap();

        assert_eq!(
            names(&result),
            vec!["HOST-01_$MFT_MFTECmd_output.csv", "HOST-01_$LogFile_MFTECmd_output.csv"]
        );
        assert_eq!(h.invocations().len(), 2);
    }

    #[tokio::test]
    async fn test_marker_is_not_passed_to_tool() {
        let h = Harness::ok();
        let marker = h.input("marker", ".hostname-marker", "lab-pc");
        let marker_path = marker.path.display().to_string();
        let inputs = vec![marker, h.input("boot", "$Boot", "b")];

        let result = h.run(h.config(), inputs).await.unwrap();

        assert_eq!(names(&result), vec!["lab-pc_$Boot_MFTECmd_output.csv"]);
        let calls = h.invocations();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].contains(&marker_path));
    }

    #[tokio::test]
    async fn test_config_marker_is_passed_through_first() {
        let h = Harness::ok();
        let inputs = vec![
            h.input("sds", "$Secure_$SDS", "s"),
            h.input("cfg", ".openrelik-config", "hostname: ws-9\n"),
        ];

        let result = h.run(h.config(), inputs).await.unwrap();

        assert_eq!(names(&result), vec![".openrelik-config", "ws-9_$Secure_$SDS_MFTECmd_output.csv"]);
        let passthrough = &result.output_files[0];
        assert_eq!(passthrough.data_type, CONFIG_PASSTHROUGH_DATA_TYPE);
        assert_eq!(std::fs::read_to_string(&passthrough.path).unwrap(), "hostname: ws-9\n");
        assert!(h.inputs_dir.join("cfg").exists());
    }

    #[tokio::test]
    async fn test_malformed_config_still_completes_without_prefix() {
        let h = Harness::ok();
        let inputs = vec![
            h.input("cfg", ".openrelik-config", "hostname: [unclosed\n"),
            h.input("i30", "$I30", "i"),
        ];

        let result = h.run(h.config(), inputs).await.unwrap();

        assert_eq!(names(&result), vec![".openrelik-config", "$I30_MFTECmd_output.csv"]);
    }

    #[tokio::test]
    async fn test_unreadable_config_marker_is_skipped() {
        let h = Harness::ok();
        let missing = InputFile::new(h.inputs_dir.join("gone"), ".openrelik-config");
        let inputs = vec![missing, h.input("mft", "$MFT", "m")];

        let result = h.run(h.config(), inputs).await.unwrap();

        assert_eq!(names(&result), vec!["$MFT_MFTECmd_output.csv"]);
        assert_eq!(h.invocations().len(), 1);
        assert!(h.leftover_dirs().is_empty());
    }

    #[tokio::test]
    async fn test_failure_fails_task_and_cleans_up() {
        let h = Harness::new(Some("usn"), 2);
        let inputs = vec![h.input("mft", "$MFT", "m"), h.input("usn", "$J", "j")];

        let err = h.run(h.config(), inputs).await.unwrap_err();

        match err {
            WorkerError::ToolFailed {
                display_name,
                exit_code,
                ..
            } => {
                assert_eq!(display_name, "$J");
                assert_eq!(exit_code, Some(2));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(h.leftover_dirs().is_empty());
        assert!(h.inputs_dir.join("usn").exists());
    }

    #[tokio::test]
    async fn test_skip_output_policy_drops_failed_descriptor() {
        let h = Harness::new(Some("boot"), 1);
        let inputs = vec![h.input("boot", "$Boot", "b"), h.input("mft", "$MFT", "m")];
        let config = h.config().with_failure_policy(ToolFailurePolicy::SkipOutput);

        let result = h.run(config, inputs).await.unwrap();

        assert_eq!(names(&result), vec!["$MFT_MFTECmd_output.csv"]);
        assert_eq!(h.invocations().len(), 2);
    }

    #[tokio::test]
    async fn test_permissive_policy_keeps_failed_descriptor() {
        let h = Harness::new(Some("boot"), 1);
        let inputs = vec![h.input("boot", "$Boot", "b"), h.input("mft", "$MFT", "m")];
        let config = h.config().with_failure_policy(ToolFailurePolicy::Permissive);

        let result = h.run(config, inputs).await.unwrap();

        assert_eq!(names(&result), vec!["$Boot_MFTECmd_output.csv", "$MFT_MFTECmd_output.csv"]);
        assert!(!result.output_files[0].path.exists());
    }

    #[tokio::test]
    async fn test_staging_is_removed_after_success() {
        let h = Harness::ok();
        h.run(h.config(), vec![h.input("indx", "INDX", "x")]).await.unwrap();

        assert!(h.leftover_dirs().is_empty());
        let remaining: Vec<PathBuf> = std::fs::read_dir(&h.output_dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].extension().and_then(|e| e.to_str()), Some("csv"));
    }

    #[tokio::test]
    async fn test_duplicate_base_filenames_fail_staging() {
        let h = Harness::ok();
        let first = h.input("dup", "$MFT", "a");
        let other_dir = h.inputs_dir.join("nested");
        std::fs::create_dir(&other_dir).unwrap();
        std::fs::write(other_dir.join("dup"), "b").unwrap();
        let second = InputFile::new(other_dir.join("dup"), "$LogFile");

        let err = h.run(h.config(), vec![first, second]).await.unwrap_err();

        assert!(matches!(err, WorkerError::Staging { .. }));
        assert!(h.leftover_dirs().is_empty());
        assert!(h.invocations().is_empty());
    }

    #[tokio::test]
    async fn test_missing_output_path_is_staging_error() {
        let h = Harness::ok();
        let ctx = TaskContext::new(TaskIdentity::new(TASK_NAME));
        let request = TaskRequest::new(h.output_dir.join("missing"), vec![h.input("mft", "$MFT", "m")]);

        let err = MftecmdTask::new(h.config()).execute(&ctx, request).await.unwrap_err();
        assert!(matches!(err, WorkerError::Staging { .. }));
    }

    #[tokio::test]
    async fn test_lifecycle_events_are_emitted() {
        let h = Harness::ok();
        let sink = Arc::new(CollectingEventSink::new());
        let ctx = TaskContext::new(TaskIdentity::new(TASK_NAME)).with_event_sink(sink.clone());
        let request = TaskRequest::new(
            &h.output_dir,
            vec![h.input("mft", "$MFT", "m"), h.input("usn", "$J", "j")],
        );

        MftecmdTask::new(h.config()).execute(&ctx, request).await.unwrap();

        assert_eq!(sink.count_of(FILE_STARTED_EVENT), 2);
        assert_eq!(sink.count_of(FILE_COMPLETED_EVENT), 2);
        let completed = sink.events_of_type(FILE_COMPLETED_EVENT);
        let payload = completed[1].1.as_ref().unwrap();
        assert_eq!(payload["display_name"], "$J");
        assert_eq!(payload["exit_code"], 0);
    }

    #[tokio::test]
    async fn test_pipe_result_takes_precedence() {
        let h = Harness::ok();
        let upstream_input = h.input("mft", "$MFT", "m");
        let upstream = TaskResult::new(
            vec![crate::core::OutputFile {
                uuid: "up-1".to_string(),
                display_name: "$MFT".to_string(),
                data_type: "openrelik:extraction:mft".to_string(),
                path: upstream_input.path.clone(),
                extension: String::new(),
                original_path: Some("C:/$MFT".to_string()),
                source_file_id: None,
            }],
            None,
            "",
        );
        let ctx = TaskContext::new(TaskIdentity::new(TASK_NAME));
        let request = TaskRequest::new(&h.output_dir, vec![h.input("boot", "$Boot", "b")])
            .with_pipe_result(upstream.encode().unwrap());

        let result = MftecmdTask::new(h.config()).execute(&ctx, request).await.unwrap();

        assert_eq!(names(&result), vec!["$MFT_MFTECmd_output.csv"]);
        assert_eq!(result.output_files[0].source_file_id.as_deref(), Some("up-1"));
        assert_eq!(result.output_files[0].original_path.as_deref(), Some("C:/$MFT"));
    }

    #[tokio::test]
    async fn test_registry_dispatches_task() {
        let h = Harness::ok();
        let registry = default_registry(h.config());
        let ctx = TaskContext::new(TaskIdentity::new(TASK_NAME));
        let request = TaskRequest::new(&h.output_dir, vec![h.input("mft", "$MFT", "m")]);

        let result = registry.dispatch(TASK_NAME, &ctx, request).await.unwrap();

        assert_eq!(names(&result), vec!["$MFT_MFTECmd_output.csv"]);
        let decoded = TaskResult::decode(&result.encode().unwrap()).unwrap();
        assert_eq!(decoded.output_files.len(), 1);
        assert!(Path::new(&decoded.output_files[0].path).exists());
    }
}
