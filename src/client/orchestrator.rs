//! 页面编排器
//!
//! 状态机：Idle → ImageLoading → ImageReady → NameLoading → NameReady →
//! PersonalityLoading → AttributesLoading → BackstoryStreaming → TimelineLoading → Complete。
//!
//! 同一时刻只发出一个请求。图像之后的步骤失败时不回退状态，只记录失败并保留已有数据；
//! 不自动重试，用户可从失败的步骤重新发起。

use futures_util::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::CatApi;
use crate::error::AppError;
use crate::models::{CatProfile, PersonalityType};
use crate::sse::{BackstoryReader, StreamProgress};

/// 页面状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageState {
    #[default]
    Idle,
    ImageLoading,
    ImageReady,
    NameLoading,
    NameReady,
    PersonalityLoading,
    AttributesLoading,
    BackstoryStreaming,
    TimelineLoading,
    Complete,
}

/// 网络步骤，按执行顺序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Image,
    Name,
    Personality,
    Attributes,
    Backstory,
    Timeline,
}

impl Step {
    fn is_story(self) -> bool {
        self >= Step::Personality
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: Step,
    pub message: String,
}

/// 发布给观察者的页面快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageSnapshot {
    pub state: PageState,
    pub image: Option<Arc<Vec<u8>>>,
    pub profile: CatProfile,
    pub failure: Option<StepFailure>,
    /// 服务端以兜底数据响应时附带的 `error` 说明
    pub notices: Vec<String>,
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("cannot {action} while page is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: PageState,
    },

    #[error("{step:?} step failed: {message}")]
    Step { step: Step, message: String },
}

pub struct PageOrchestrator<A: CatApi> {
    api: A,
    page: PageSnapshot,
    updates: watch::Sender<PageSnapshot>,
}

impl<A: CatApi> PageOrchestrator<A> {
    pub fn new(api: A) -> Self {
        let (updates, _) = watch::channel(PageSnapshot::default());
        Self {
            api,
            page: PageSnapshot::default(),
            updates,
        }
    }

    /// 订阅状态变化；每次转换后收到一份快照
    pub fn subscribe(&self) -> watch::Receiver<PageSnapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        &self.page
    }

    pub fn state(&self) -> PageState {
        self.page.state
    }

    fn publish(&self) {
        self.updates.send_replace(self.page.clone());
    }

    fn transition(&mut self, state: PageState) {
        debug!("Page state {:?} -> {:?}", self.page.state, state);
        self.page.state = state;
        self.publish();
    }

    fn fail(&mut self, step: Step, error: AppError) -> OrchestratorError {
        let message = error.to_string();
        warn!("{:?} step failed: {}", step, message);
        self.page.failure = Some(StepFailure {
            step,
            message: message.clone(),
        });
        self.publish();
        OrchestratorError::Step { step, message }
    }

    fn notice(&mut self, error: Option<String>) {
        if let Some(error) = error {
            warn!("Server returned fallback data: {}", error);
            self.page.notices.push(error);
        }
    }

    fn failed_step(&self) -> Option<Step> {
        self.page.failure.as_ref().map(|f| f.step)
    }

    fn invalid(&self, action: &'static str) -> OrchestratorError {
        OrchestratorError::InvalidTransition {
            action,
            state: self.page.state,
        }
    }

    /// 请求一只新猫：任何状态下都允许，丢弃之前的全部数据
    pub async fn new_cat(&mut self) -> Result<(), OrchestratorError> {
        self.page = PageSnapshot {
            state: PageState::ImageLoading,
            ..PageSnapshot::default()
        };
        self.publish();

        match self.api.cat_image().await {
            Ok(png) => {
                info!("Cat image loaded, {} bytes", png.len());
                self.page.image = Some(Arc::new(png));
                self.transition(PageState::ImageReady);
                Ok(())
            }
            Err(e) => {
                self.page.state = PageState::Idle;
                Err(self.fail(Step::Image, e))
            }
        }
    }

    /// 建议名字：仅在图像就绪或名字步骤失败后允许
    pub async fn suggest_name(&mut self) -> Result<(), OrchestratorError> {
        let retry = self.failed_step() == Some(Step::Name);
        if self.page.state != PageState::ImageReady && !retry {
            return Err(self.invalid("suggest a name"));
        }
        let image = self.page.image.clone().ok_or_else(|| self.invalid("suggest a name"))?;

        self.page.failure = None;
        self.transition(PageState::NameLoading);

        let response = self
            .api
            .suggest_name(&image)
            .await
            .map_err(|e| self.fail(Step::Name, e))?;
        info!("Name suggested: {}", response.name);
        self.notice(response.error);
        self.page.profile.name = Some(response.name);
        self.transition(PageState::NameReady);
        Ok(())
    }

    /// 生成人格、属性、背景故事与时间线
    ///
    /// 在名字就绪后从头开始；上一次在某一步失败时从该步继续。
    pub async fn discover_story(&mut self) -> Result<(), OrchestratorError> {
        let from = match (self.page.state, self.failed_step()) {
            (PageState::NameReady, _) => Step::Personality,
            (_, Some(step)) if step.is_story() => step,
            _ => return Err(self.invalid("discover the story")),
        };
        let image = self
            .page
            .image
            .clone()
            .ok_or_else(|| self.invalid("discover the story"))?;
        let name = self
            .page
            .profile
            .name
            .clone()
            .ok_or_else(|| self.invalid("discover the story"))?;

        self.page.failure = None;
        self.run_story(from, &image, &name).await
    }

    async fn run_story(
        &mut self,
        from: Step,
        image: &[u8],
        name: &str,
    ) -> Result<(), OrchestratorError> {
        if from <= Step::Personality {
            self.transition(PageState::PersonalityLoading);
            let response = self
                .api
                .personality(image, name)
                .await
                .map_err(|e| self.fail(Step::Personality, e))?;
            self.notice(response.error);
            self.page.profile.personality_type = Some(response.personality_type);
        }

        let personality = self.page.profile.personality_type.clone();

        if from <= Step::Attributes {
            self.transition(PageState::AttributesLoading);
            let personality = personality
                .clone()
                .unwrap_or_else(PersonalityType::fallback);
            let response = self
                .api
                .attributes(image, name, &personality)
                .await
                .map_err(|e| self.fail(Step::Attributes, e))?;
            self.notice(response.error);
            self.page.profile.dnd_attributes = Some(response.dnd_attributes);
        }

        let backstory = if from <= Step::Backstory {
            self.transition(PageState::BackstoryStreaming);
            self.stream_backstory(image, name, personality.as_ref())
                .await
                .map_err(|e| self.fail(Step::Backstory, e))?
        } else {
            self.page.profile.backstory.clone()
        };

        self.transition(PageState::TimelineLoading);
        let response = self
            .api
            .timeline(name, personality.as_ref(), &backstory)
            .await
            .map_err(|e| self.fail(Step::Timeline, e))?;
        self.notice(response.error);
        self.page.profile.timeline = response.timeline;
        self.transition(PageState::Complete);
        info!("Story complete for {}", name);
        Ok(())
    }

    /// 读取背景故事流直到终止事件，返回完整文本
    ///
    /// 收到终止事件后立即丢弃响应体，不再读取后续字节。
    async fn stream_backstory(
        &mut self,
        image: &[u8],
        name: &str,
        personality: Option<&PersonalityType>,
    ) -> Result<String, AppError> {
        self.page.profile.backstory.clear();
        let mut body = self.api.backstory_stream(image, name, personality).await?;
        let mut reader = BackstoryReader::new();

        while let Some(chunk) = body.next().await {
            let progress = reader.feed(&chunk?);
            if reader.text() != self.page.profile.backstory {
                self.page.profile.backstory = reader.text().to_string();
                self.publish();
            }
            match progress {
                StreamProgress::Pending => continue,
                StreamProgress::Done(text) => {
                    info!("Backstory stream done, {} chars", text.chars().count());
                    return Ok(text);
                }
                StreamProgress::Failed(message) => return Err(AppError::Upstream(message)),
            }
        }

        Err(AppError::Upstream(
            "backstory stream ended before completion".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::{AttributesResponse, NameResponse, PersonalityResponse, TimelineResponse};
    use crate::client::ByteStream;
    use crate::error::Result;
    use crate::models::{DndAttributes, TimelineEvent};
    use async_trait::async_trait;
    use futures_util::stream;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        image: AtomicUsize,
        name: AtomicUsize,
        personality: AtomicUsize,
        attributes: AtomicUsize,
        stream_polls: Arc<AtomicUsize>,
        timeline: AtomicUsize,
    }

    struct FakeApi {
        calls: Arc<Calls>,
        chunks: Vec<&'static str>,
        fail_personality: Mutex<bool>,
        timeline_backstory: Arc<Mutex<Option<String>>>,
    }

    impl FakeApi {
        fn new(chunks: Vec<&'static str>) -> Self {
            Self {
                calls: Arc::new(Calls::default()),
                chunks,
                fail_personality: Mutex::new(false),
                timeline_backstory: Arc::new(Mutex::new(None)),
            }
        }
    }

    #[async_trait]
    impl CatApi for FakeApi {
        async fn cat_image(&self) -> Result<Vec<u8>> {
            self.calls.image.fetch_add(1, Ordering::SeqCst);
            Ok(b"\x89PNG".to_vec())
        }

        async fn suggest_name(&self, _image: &[u8]) -> Result<NameResponse> {
            self.calls.name.fetch_add(1, Ordering::SeqCst);
            Ok(NameResponse {
                success: true,
                name: "Nimbusbean".to_string(),
                prefixes: vec![],
                suffixes: vec![],
                error: None,
            })
        }

        async fn personality(&self, _image: &[u8], _name: &str) -> Result<PersonalityResponse> {
            self.calls.personality.fetch_add(1, Ordering::SeqCst);
            if *self.fail_personality.lock() {
                return Err(AppError::Upstream("500 Internal Server Error".into()));
            }
            Ok(PersonalityResponse {
                personality_type: PersonalityType::new("ENFP", "The Campaigner"),
                error: None,
            })
        }

        async fn attributes(
            &self,
            _image: &[u8],
            _name: &str,
            personality: &PersonalityType,
        ) -> Result<AttributesResponse> {
            self.calls.attributes.fetch_add(1, Ordering::SeqCst);
            assert_eq!(personality.code, "ENFP");
            Ok(AttributesResponse {
                dnd_attributes: DndAttributes::fixed_fallback(),
                error: Some("fallback".into()),
            })
        }

        async fn backstory_stream(
            &self,
            _image: &[u8],
            _name: &str,
            _personality: Option<&PersonalityType>,
        ) -> Result<ByteStream> {
            let polls = self.calls.stream_polls.clone();
            let chunks: Vec<Result<Vec<u8>>> =
                self.chunks.iter().map(|c| Ok(c.as_bytes().to_vec())).collect();
            Ok(stream::iter(chunks)
                .inspect(move |_| {
                    polls.fetch_add(1, Ordering::SeqCst);
                })
                .boxed())
        }

        async fn timeline(
            &self,
            name: &str,
            _personality: Option<&PersonalityType>,
            backstory: &str,
        ) -> Result<TimelineResponse> {
            self.calls.timeline.fetch_add(1, Ordering::SeqCst);
            *self.timeline_backstory.lock() = Some(backstory.to_string());
            Ok(TimelineResponse {
                timeline: TimelineEvent::default_timeline(name),
                error: None,
            })
        }
    }

    const HAPPY_STREAM: &[&str] = &[
        "event: start\ndata: {}\n\nevent: text\ndata: {\"text\":\"Nimbus\"}\n",
        "\nevent: text\ndata: {\"text\":\" naps \\u00e9t\u{e9}\"}\n\n",
        "event: done\ndata: {}\n\nevent: text\ndata: {\"text\":\"late\"}\n\n",
        "event: text\ndata: {\"text\":\"never read\"}\n\n",
    ];

    async fn ready_for_story(api: FakeApi) -> PageOrchestrator<FakeApi> {
        let mut page = PageOrchestrator::new(api);
        page.new_cat().await.unwrap();
        page.suggest_name().await.unwrap();
        assert_eq!(page.state(), PageState::NameReady);
        page
    }

    #[tokio::test]
    async fn test_full_flow_reaches_complete() {
        let api = FakeApi::new(HAPPY_STREAM.to_vec());
        let calls = api.calls.clone();
        let handed_over = api.timeline_backstory.clone();

        let mut page = ready_for_story(api).await;
        page.discover_story().await.unwrap();

        let snapshot = page.snapshot();
        assert_eq!(snapshot.state, PageState::Complete);
        assert_eq!(snapshot.profile.name.as_deref(), Some("Nimbusbean"));
        assert_eq!(snapshot.profile.backstory, "Nimbus naps été");
        assert_eq!(snapshot.profile.timeline.len(), 5);
        assert_eq!(snapshot.notices, vec!["fallback".to_string()]);
        assert!(snapshot.failure.is_none());

        assert_eq!(calls.timeline.load(Ordering::SeqCst), 1);
        assert_eq!(handed_over.lock().as_deref(), Some("Nimbus naps été"));
        // 终止事件所在的块之后不再读取
        assert_eq!(calls.stream_polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_observers_see_each_transition() {
        let api = FakeApi::new(HAPPY_STREAM.to_vec());
        let mut page = PageOrchestrator::new(api);
        let mut updates = page.subscribe();

        page.new_cat().await.unwrap();
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().state, PageState::ImageReady);

        page.suggest_name().await.unwrap();
        assert_eq!(updates.borrow_and_update().state, PageState::NameReady);
    }

    #[tokio::test]
    async fn test_story_requires_name() {
        let mut page = PageOrchestrator::new(FakeApi::new(HAPPY_STREAM.to_vec()));
        page.new_cat().await.unwrap();

        let err = page.discover_story().await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::InvalidTransition {
                state: PageState::ImageReady,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_name_not_allowed_before_image() {
        let mut page = PageOrchestrator::new(FakeApi::new(vec![]));
        assert!(matches!(
            page.suggest_name().await,
            Err(OrchestratorError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_failure_keeps_state_and_allows_retry() {
        let api = FakeApi::new(HAPPY_STREAM.to_vec());
        *api.fail_personality.lock() = true;
        let calls = api.calls.clone();

        let mut page = ready_for_story(api).await;
        let err = page.discover_story().await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Step { step: Step::Personality, .. }));
        assert_eq!(page.state(), PageState::PersonalityLoading);
        assert_eq!(page.snapshot().profile.name.as_deref(), Some("Nimbusbean"));
        assert!(page.snapshot().image.is_some());
        assert_eq!(calls.attributes.load(Ordering::SeqCst), 0);

        *page.api.fail_personality.lock() = false;
        page.discover_story().await.unwrap();
        assert_eq!(page.state(), PageState::Complete);
        assert_eq!(calls.personality.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stream_error_event_fails_backstory_step() {
        let api = FakeApi::new(vec![
            "event: start\ndata: {}\n\nevent: text\ndata: {\"text\":\"Half\"}\n\n",
            "event: error\ndata: {\"message\":\"Stream error\"}\n\n",
        ]);
        let calls = api.calls.clone();

        let mut page = ready_for_story(api).await;
        let err = page.discover_story().await.unwrap_err();

        assert!(matches!(err, OrchestratorError::Step { step: Step::Backstory, .. }));
        assert_eq!(page.state(), PageState::BackstoryStreaming);
        assert_eq!(page.snapshot().profile.backstory, "Half");
        assert_eq!(calls.timeline.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_truncated_stream_is_a_failure() {
        let api = FakeApi::new(vec!["event: start\ndata: {}\n\nevent: text\ndata: {\"text\":\"Cut"]);
        let mut page = ready_for_story(api).await;

        let err = page.discover_story().await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Step { step: Step::Backstory, .. }));
    }

    #[tokio::test]
    async fn test_new_cat_discards_profile() {
        let api = FakeApi::new(HAPPY_STREAM.to_vec());
        let mut page = ready_for_story(api).await;
        page.discover_story().await.unwrap();

        page.new_cat().await.unwrap();
        let snapshot = page.snapshot();
        assert_eq!(snapshot.state, PageState::ImageReady);
        assert_eq!(snapshot.profile, CatProfile::default());
        assert!(snapshot.notices.is_empty());
    }
}
