// tests/failure_recovery.rs

use std::error::Error;
use std::sync::Arc;

use assetflow::engine::ChainOutcome;
use assetflow::tasks::{run_chain, ChainKind, TaskChain};
use assetflow::types::{BuildMode, Category, Layout};
use assetflow_test_utils::builders::{ConfigFileBuilder, ProjectFixture};
use assetflow_test_utils::notifier::RecordingNotifier;
use assetflow_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

struct Harness {
    project: ProjectFixture,
    notifier: RecordingNotifier,
}

impl Harness {
    fn new() -> Self {
        Self {
            project: ProjectFixture::new(),
            notifier: RecordingNotifier::new(),
        }
    }

    async fn run(&self, category: Category, kind: ChainKind) -> ChainOutcome {
        let ctx = self.project.context(
            BuildMode::Development,
            Layout::Ltr,
            ConfigFileBuilder::new().build(),
            Arc::new(self.notifier.clone()),
        );
        with_timeout(run_chain(ctx, &TaskChain::for_category(category, kind))).await
    }
}

#[tokio::test]
async fn malformed_stylesheet_notifies_and_keeps_previous_output() -> TestResult {
    init_tracing();
    let h = Harness::new();
    h.project.write("src/scss/main.scss", ".a {\n  color: red;\n}\n");

    assert_eq!(h.run(Category::Styles, ChainKind::OneShot).await, ChainOutcome::Success);
    let good = h.project.read("publicDev/assets/css/main.css");
    h.notifier.clear();

    h.project.write("src/scss/main.scss", ".a {\n  color: $undefined;\n}\n");
    let outcome = h.run(Category::Styles, ChainKind::OneShot).await;

    assert_eq!(outcome, ChainOutcome::Failed(1));
    let errors = h.notifier.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].title, "Compiling error with \"sass\"");
    assert!(errors[0].message.contains("main.scss"), "{}", errors[0].message);
    assert!(h.notifier.successes().is_empty());
    assert_eq!(h.project.read("publicDev/assets/css/main.css"), good);
    Ok(())
}

#[tokio::test]
async fn style_lint_errors_block_until_the_source_is_fixed() -> TestResult {
    init_tracing();
    let h = Harness::new();
    h.project.write("src/scss/main.scss", "#main {\n  color: red;\n}\n");

    let outcome = h.run(Category::Styles, ChainKind::Watch).await;
    assert_eq!(outcome, ChainOutcome::Blocked);
    assert!(!h.project.exists("publicDev/assets/css/main.css"));
    assert_eq!(h.notifier.errors()[0].title, "Compiling error with \"style-lint\"");

    h.project.write("src/scss/main.scss", ".main {\n  color: red;\n}\n");
    let outcome = h.run(Category::Styles, ChainKind::Watch).await;
    assert_eq!(outcome, ChainOutcome::Success);
    assert!(h.project.exists("publicDev/assets/css/main.css"));
    Ok(())
}

#[tokio::test]
async fn lint_errors_in_partials_also_block() -> TestResult {
    init_tracing();
    let h = Harness::new();
    h.project
        .write("src/scss/main.scss", "@use 'mixins';\n")
        .write("src/scss/_mixins.scss", ".x {\n  color: red !important;\n}\n");

    assert_eq!(h.run(Category::Styles, ChainKind::Watch).await, ChainOutcome::Blocked);
    Ok(())
}

#[tokio::test]
async fn one_shot_style_builds_skip_lint() -> TestResult {
    init_tracing();
    let h = Harness::new();
    h.project.write("src/scss/main.scss", "#main {\n  color: red;\n}\n");

    assert_eq!(h.run(Category::Styles, ChainKind::OneShot).await, ChainOutcome::Success);
    assert!(h.project.exists("publicDev/assets/css/main.css"));
    Ok(())
}

#[tokio::test]
async fn script_lint_reports_but_never_blocks() -> TestResult {
    init_tracing();
    let h = Harness::new();
    h.project.write("src/js/app.js", "debugger;\nif (a == 1) { go(); }\n");

    assert_eq!(h.run(Category::Scripts, ChainKind::Watch).await, ChainOutcome::Success);
    assert!(h.project.exists("publicDev/assets/js/app.min.js"));
    assert!(h.notifier.errors().is_empty());
    Ok(())
}

#[tokio::test]
async fn script_syntax_error_writes_no_bundle() -> TestResult {
    init_tracing();
    let h = Harness::new();
    h.project
        .write("src/js/libs/ok.js", "var ok = 1;\n")
        .write("src/js/app.js", "var ok2 = ;\n");

    let outcome = h.run(Category::Scripts, ChainKind::OneShot).await;

    assert!(matches!(outcome, ChainOutcome::Failed(_)), "{outcome:?}");
    assert!(!h.project.exists("publicDev/assets/js/app.js"));
    assert!(!h.project.exists("publicDev/assets/js/app.min.js"));
    let errors = h.notifier.errors();
    assert!(errors[0].message.contains("app.js:1:"), "{}", errors[0].message);
    Ok(())
}

#[tokio::test]
async fn broken_template_does_not_stop_the_others() -> TestResult {
    init_tracing();
    let h = Harness::new();
    h.project
        .write("src/kit/index.kit", "<p>{{ site }</p>\n")
        .write("src/kit/about.kit", "<p>about</p>\n");

    let outcome = h.run(Category::Templates, ChainKind::OneShot).await;

    assert_eq!(outcome, ChainOutcome::Failed(1));
    assert!(h.project.exists("publicDev/about.html"));
    assert!(!h.project.exists("publicDev/index.html"));
    assert_eq!(h.notifier.errors()[0].title, "Compiling error with \"minijinja\"");
    Ok(())
}
