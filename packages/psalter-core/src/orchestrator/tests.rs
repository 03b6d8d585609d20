use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::task::LocalSet;
use tokio::time::sleep;

use super::*;
use crate::address::MemoryAddress;
use crate::engine::{LocalBoxFuture, RenderOptions};
use crate::error::PsalterError;

const MANIFEST: &str = r#"[
    { "type": "heading", "title": "Psalms of Trust" },
    { "type": "psalm", "title": "Psalm 23", "tune": "23.abc", "text": "23.txt" },
    { "type": "psalm", "title": "Psalm 121", "tune": "121.abc", "text": "121.txt" }
]"#;

const PSALM_23: &str = "X:1\n%%staves [(S A) (T B)]\nK:G\nV:S\nG2|\nV:A\nD2|\nV:T\nB,2|\nV:B\nG,2|";
const PSALM_121: &str = "X:1\nK:D\nV:S\nd2|\nV:B\nD,2|";

#[derive(Debug, Clone, PartialEq)]
struct RenderCall {
    target: String,
    notation: String,
    options: RenderOptions,
}

#[derive(Debug, Clone, PartialEq)]
struct TestControl {
    target: String,
    serial: u32,
    transpose: i32,
}

#[derive(Default)]
struct TestEngine {
    renders: RefCell<Vec<RenderCall>>,
    serial: Cell<u32>,
    /// Delays for successive playback builds; missing entries build instantly.
    build_delays: RefCell<VecDeque<Duration>>,
}

impl TestEngine {
    fn renders(&self) -> Vec<RenderCall> {
        self.renders.borrow().clone()
    }

    fn clear(&self) {
        self.renders.borrow_mut().clear();
    }
}

impl RenderEngine for TestEngine {
    type Handle = u32;
    type Control = TestControl;

    fn render(
        &self,
        target: &str,
        notation: &str,
        options: &RenderOptions,
    ) -> Result<u32, PsalterError> {
        self.renders.borrow_mut().push(RenderCall {
            target: target.to_string(),
            notation: notation.to_string(),
            options: *options,
        });
        self.serial.set(self.serial.get() + 1);
        Ok(self.serial.get())
    }

    fn build_playback(
        &self,
        handle: u32,
        target: &str,
        transpose: i32,
    ) -> LocalBoxFuture<Result<TestControl, PsalterError>> {
        let delay = self.build_delays.borrow_mut().pop_front();
        let control = TestControl {
            target: target.to_string(),
            serial: handle,
            transpose,
        };
        Box::pin(async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            Ok(control)
        })
    }
}

#[derive(Default)]
struct TestFetcher {
    files: HashMap<String, String>,
    delays: HashMap<String, Duration>,
    requested: RefCell<Vec<String>>,
}

impl TestFetcher {
    fn psalms() -> Self {
        let mut fetcher = TestFetcher::default();
        fetcher.add("playlist.json", MANIFEST);
        fetcher.add("abc/23.abc", PSALM_23);
        fetcher.add("abc/121.abc", PSALM_121);
        fetcher.add("text/23.txt", "The **Lord** is my shepherd");
        fetcher.add("text/121.txt", "I will lift up mine *eyes*");
        fetcher
    }

    fn add(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }

    fn delay(&mut self, path: &str, millis: u64) {
        self.delays.insert(path.to_string(), Duration::from_millis(millis));
    }
}

impl Fetcher for TestFetcher {
    fn fetch(&self, path: &str) -> LocalBoxFuture<Result<String, PsalterError>> {
        self.requested.borrow_mut().push(path.to_string());
        let delay = self.delays.get(path).copied().unwrap_or_default();
        let result = self.files.get(path).cloned().ok_or_else(|| PsalterError::Fetch {
            path: path.to_string(),
            message: "not found".to_string(),
        });
        Box::pin(async move {
            sleep(delay).await;
            result
        })
    }
}

fn psalter(address: &str) -> Psalter<TestEngine, MemoryAddress> {
    Psalter::new(
        TestEngine::default(),
        MemoryAddress::parse(address).unwrap(),
        640,
    )
}

async fn loaded(address: &str) -> Psalter<TestEngine, MemoryAddress> {
    let psalter = psalter(address);
    let report = psalter
        .load(&TestFetcher::psalms(), &SourceLayout::default())
        .await
        .unwrap();
    assert_eq!(report, LoadReport { retrievals: 4, failures: 0 });
    psalter
}

#[tokio::test]
async fn test_load_renders_every_psalm() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/").await;

            let mut renders = psalter.engine().renders();
            renders.sort_by(|a, b| a.target.cmp(&b.target));
            assert_eq!(renders.len(), 2);
            assert_eq!(renders[0].target, "abc1");
            assert_eq!(renders[0].notation, PSALM_23);
            assert_eq!(renders[1].target, "abc2");
            assert_eq!(
                renders[0].options,
                RenderOptions {
                    display_width: 640,
                    transpose: 0
                }
            );

            let session = psalter.session();
            assert_eq!(session.cache.notation(1), Some(PSALM_23));
            assert_eq!(session.cache.control_count(), 2);
            assert_eq!(
                session.page.section(1).unwrap().text.as_deref(),
                Some("The <strong>Lord</strong> is my shepherd")
            );
            assert_eq!(
                session.page.section(2).unwrap().text.as_deref(),
                Some("I will lift up mine <em>eyes</em>")
            );
        })
        .await;
}

#[tokio::test]
async fn test_load_applies_address_state() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/?t=2&v=sa").await;

            let renders = psalter.engine().renders();
            let psalm_23 = renders.iter().find(|r| r.target == "abc1").unwrap();
            assert_eq!(
                psalm_23.notation,
                "X:1\n%%staves [(S A)]\nK:G\nV:S\nG2|\nV:A\nD2|"
            );
            assert_eq!(psalm_23.options.transpose, 2);

            let session = psalter.session();
            assert_eq!(session.cache.control(1).unwrap().transpose, 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_load_launches_all_retrievals_before_awaiting() {
    LocalSet::new()
        .run_until(async {
            let mut fetcher = TestFetcher::psalms();
            fetcher.delay("abc/23.abc", 5_000);
            let psalter = psalter("https://example.org/");
            let layout = SourceLayout::default();

            let load = psalter.load(&fetcher, &layout);
            tokio::pin!(load);

            tokio::select! {
                _ = &mut load => panic!("load finished before the stalled retrieval"),
                _ = sleep(Duration::from_millis(100)) => {}
            }

            assert_eq!(fetcher.requested.borrow().len(), 5);
            // the stalled psalm does not hold back the other one
            let renders = psalter.engine().renders();
            assert_eq!(renders.len(), 1);
            assert_eq!(renders[0].target, "abc2");

            let report = load.await.unwrap();
            assert_eq!(report.failures, 0);
            assert_eq!(psalter.engine().renders().len(), 2);
        })
        .await;
}

#[tokio::test]
async fn test_failed_retrieval_leaves_section_incomplete() {
    LocalSet::new()
        .run_until(async {
            let mut fetcher = TestFetcher::psalms();
            fetcher.files.remove("text/121.txt");
            fetcher.files.remove("abc/23.abc");
            let psalter = psalter("https://example.org/");

            let report = psalter
                .load(&fetcher, &SourceLayout::default())
                .await
                .unwrap();
            assert_eq!(report, LoadReport { retrievals: 4, failures: 2 });

            let session = psalter.session();
            assert_eq!(session.cache.notation(1), None);
            assert!(session.cache.control(1).is_none());
            assert!(session.page.section(1).unwrap().text.is_some());
            assert_eq!(session.cache.notation(2), Some(PSALM_121));
            assert!(session.page.section(2).unwrap().text.is_none());
        })
        .await;
}

#[tokio::test]
async fn test_missing_manifest_is_an_error() {
    LocalSet::new()
        .run_until(async {
            let psalter = psalter("https://example.org/");
            let result = psalter
                .load(&TestFetcher::default(), &SourceLayout::default())
                .await;
            assert!(matches!(result, Err(PsalterError::Fetch { .. })));
        })
        .await;
}

#[tokio::test]
async fn test_toggle_voice_rerenders_from_cache() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/#psalm-23").await;
            psalter.engine().clear();

            psalter.toggle_voice(Voice::Bass).await;

            {
                let session = psalter.session();
                assert_eq!(session.address.current().as_str(), "https://example.org/?v=SAT#psalm-23");
                assert_eq!(session.address.history_len(), 1);
            }

            let renders = psalter.engine().renders();
            let targets: Vec<&str> = renders.iter().map(|r| r.target.as_str()).collect();
            assert_eq!(targets, vec!["abc1", "abc2"]);
            assert_eq!(
                renders[0].notation,
                "X:1\n%%staves [(S A) (T)]\nK:G\nV:S\nG2|\nV:A\nD2|\nV:T\nB,2|"
            );
            assert_eq!(renders[1].notation, "X:1\nK:D\nV:S\nd2|");

            let session = psalter.session();
            let control = session.cache.control(1).unwrap();
            assert_eq!(control.serial, 3);
        })
        .await;
}

#[tokio::test]
async fn test_toggle_order_gives_canonical_address() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/").await;
            psalter.toggle_voice(Voice::Bass).await;
            psalter.toggle_voice(Voice::Alto).await;
            psalter.toggle_voice(Voice::Tenor).await;
            psalter.toggle_voice(Voice::Alto).await;

            assert_eq!(psalter.session().address.current().query(), Some("v=SA"));
            assert_eq!(psalter.view_state().voices.to_string(), "SA");
        })
        .await;
}

#[tokio::test]
async fn test_transpose_down_rewrites_address() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/?t=-3").await;
            assert_eq!(psalter.view_state().transpose, -3);
            psalter.engine().clear();

            psalter.transpose_down().await;

            assert_eq!(psalter.session().address.current().query(), Some("t=-4"));
            let renders = psalter.engine().renders();
            assert!(renders.iter().all(|r| r.options.transpose == -4));
            assert_eq!(psalter.session().cache.control(2).unwrap().transpose, -4);
        })
        .await;
}

#[tokio::test]
async fn test_transpose_back_to_zero_removes_param() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/?t=-1").await;
            psalter.transpose_up().await;
            assert_eq!(psalter.session().address.current().as_str(), "https://example.org/");
            assert_eq!(psalter.view_state().transpose, 0);
        })
        .await;
}

#[tokio::test]
async fn test_rerender_without_cache_is_a_no_op() {
    LocalSet::new()
        .run_until(async {
            let psalter = psalter("https://example.org/");
            psalter.rerender_all().await;
            assert!(psalter.engine().renders().is_empty());
        })
        .await;
}

#[tokio::test]
async fn test_visual_render_happens_before_await() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/").await;
            psalter.engine().clear();

            let pending = psalter.set_transpose(5);
            assert_eq!(psalter.engine().renders().len(), 2);
            pending.await;
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_resize_is_debounced() {
    LocalSet::new()
        .run_until(async {
            let mut psalter = loaded("https://example.org/").await;
            psalter.engine().clear();

            for width in [700, 710, 720] {
                psalter.resize(width);
                sleep(Duration::from_millis(100)).await;
            }
            assert!(psalter.resize_pending());
            assert!(psalter.engine().renders().is_empty());

            sleep(Duration::from_millis(300)).await;
            assert!(!psalter.resize_pending());

            let renders = psalter.engine().renders();
            assert_eq!(renders.len(), 2);
            assert!(renders.iter().all(|r| r.options.display_width == 720));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_superseded_playback_build_is_discarded() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/").await;

            // first pass builds slowly, second quickly
            psalter.engine().build_delays.borrow_mut().extend([
                Duration::from_millis(500),
                Duration::from_millis(500),
                Duration::from_millis(100),
                Duration::from_millis(100),
            ]);
            let slow = psalter.set_transpose(1);
            let fast = psalter.set_transpose(2);

            fast.await;
            assert_eq!(psalter.session().cache.control(1).unwrap().transpose, 2);

            slow.await;
            let session = psalter.session();
            assert_eq!(session.view_state().transpose, 2);
            for index in [1, 2] {
                assert_eq!(session.cache.control(index).unwrap().transpose, 2);
            }
            assert_eq!(session.cache.control_count(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_latest_render_controls_playback_when_builds_finish_in_order() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/").await;

            psalter.engine().build_delays.borrow_mut().extend([
                Duration::from_millis(100),
                Duration::from_millis(100),
                Duration::from_millis(500),
                Duration::from_millis(500),
            ]);
            let first = psalter.set_transpose(1);
            let second = psalter.set_transpose(2);

            first.await;
            assert_eq!(psalter.session().cache.control(1).unwrap().transpose, 0);

            second.await;
            assert_eq!(psalter.session().cache.control(1).unwrap().transpose, 2);
        })
        .await;
}

#[tokio::test]
async fn test_scroll_target() {
    LocalSet::new()
        .run_until(async {
            let psalter = loaded("https://example.org/?v=S#psalm-121").await;
            match psalter.scroll_target() {
                Some(crate::page::Block::Section(section)) => assert_eq!(section.index, 2),
                other => panic!("unexpected scroll target {:?}", other),
            }
            assert!(loaded("https://example.org/").await.scroll_target().is_none());
        })
        .await;
}
