//! MX4J JMX 메트릭 수집 모듈
//!
//! 대상 JVM 프로세스의 MX4J HTTP 어댑터에서 JMX 메트릭을 수집합니다.
//! 한 사이클은 빈 해석 → 빈별 질의 → 평탄화 → 병합 → 싱크 게시의
//! 순차 파이프라인입니다.
//!
//! # Example
//!
//! ```ignore
//! use mx4j_collector::collector::Collector;
//! use mx4j_collector::config::Config;
//! use mx4j_collector::sink::TracingSink;
//!
//! let collector = Collector::new(Config::default())?;
//! collector.collect(&TracingSink).await;
//! ```

mod client;
mod parser;

pub use client::Mx4jClient;
pub use parser::{
    flatten_mbean, parse_bean_names, AttributeNode, MetricValue, NumericKind, ObjectName,
};

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::CollectResult;
use crate::sink::MetricSink;

/// 한 수집 사이클의 출력 - 메트릭 경로 → 값 매핑
///
/// 키는 유일하고, 병합 시 나중 값이 이전 값을 덮어쓴다. 순회 순서는
/// 결정적이다.
pub type MetricSnapshot = BTreeMap<String, MetricValue>;

/// 로그 세그먼트 stat 빈 질의 패턴
const LOG_BEAN_PATTERN: &str = "kafka:type=kafka.logs.*";

/// JVM garbage collector 빈 질의 패턴
const GC_BEAN_PATTERN: &str = "java.lang:type=GarbageCollector,name=*";

/// JVM threading 빈 질의 패턴
const THREADING_BEAN_PATTERN: &str = "java.lang:type=Threading";

/// 메트릭 경로 prefix 유도 규칙
///
/// 빈 이름 체계가 도메인마다 다르므로 유도 규칙은 질의 플랜 항목마다
/// 따로 붙는다.
#[derive(Debug, Clone, PartialEq)]
pub enum PrefixRule {
    /// 빈 이름의 property에서 경로 유도 (`ObjectName::metric_path`)
    BeanPath,
    /// 고정 카테고리 라벨. 빈에 `name` property가 있으면 뒤에 붙인다
    Category(String),
    /// 지정한 prefix를 그대로 사용
    Override(String),
}

impl PrefixRule {
    /// `Category` 규칙 생성 헬퍼
    pub fn category(label: &str) -> Self {
        PrefixRule::Category(label.to_string())
    }

    /// 빈 하나에 적용할 prefix 유도
    pub fn derive(&self, bean: &ObjectName) -> String {
        match self {
            PrefixRule::BeanPath => bean.metric_path(),
            PrefixRule::Category(label) => match bean.property("name") {
                Some(name) => format!("{}.{}", label, name),
                None => label.clone(),
            },
            PrefixRule::Override(prefix) => prefix.clone(),
        }
    }
}

/// 수집기 - 설정된 엔드포인트에 대한 한 사이클 단위의 수집 파이프라인
///
/// 내부 동기화와 장기 상태가 없다. 사이클이 겹치지 않게 하는 것은
/// 호출하는 스케줄러의 책임이다.
pub struct Collector {
    client: Mx4jClient,
    config: Config,
}

impl Collector {
    /// 새 Collector 생성
    pub fn new(config: Config) -> CollectResult<Self> {
        let client = Mx4jClient::new(&config.endpoint)?;
        Ok(Self { client, config })
    }

    /// 호스트 스케줄러가 소비하는 폴링 간격
    pub fn interval(&self) -> Duration {
        self.config.interval()
    }

    /// fetch 경계 - 모든 전송 실패를 로그 후 `None`으로 변환
    ///
    /// 네트워크 에러는 이 경계를 넘지 않는다.
    async fn fetch(&self, path: &str, query: &[(&str, &str)]) -> Option<String> {
        match self.client.get(path, query).await {
            Ok(body) => Some(body),
            Err(err) => {
                warn!(path = %path, error = %err, "Management endpoint fetch failed");
                None
            }
        }
    }

    /// 패턴에 매칭되는 빈 이름 집합 해석
    ///
    /// `None`은 질의 실패, `Some(빈 집합)`은 매칭되는 빈이 없는 정상
    /// 응답이다. 둘을 구분하는 것이 호출자 계약의 핵심이다.
    pub async fn get_mbeans(&self, pattern: &str) -> Option<BTreeSet<String>> {
        let body = self
            .fetch("/serverbydomain", &[("querynames", pattern)])
            .await?;

        match parser::parse_bean_names(&body) {
            Ok(names) => Some(names),
            Err(err) => {
                warn!(pattern = %pattern, error = %err, "Unable to parse bean listing");
                None
            }
        }
    }

    /// 패턴 하나에 대한 질의 - prefix를 직접 지정하거나 빈 경로 유도
    ///
    /// `prefix`가 `Some`이면 모든 leaf 앞에 그대로 붙고, `None`이면
    /// 빈 이름에서 유도한 경로가 붙는다.
    pub async fn query_mbean(
        &self,
        pattern: &str,
        prefix: Option<&str>,
    ) -> Option<MetricSnapshot> {
        let rule = match prefix {
            Some(p) => PrefixRule::Override(p.to_string()),
            None => PrefixRule::BeanPath,
        };
        self.query_with_rule(pattern, &rule).await
    }

    /// 패턴 하나에 대한 질의 - 명시적 prefix 규칙 적용
    ///
    /// 빈 해석이 실패하면 전체가 `None`이다. 해석은 됐지만 매칭 빈이
    /// 없으면 빈 매핑을 반환한다. 개별 빈의 질의/파싱 실패는 그 빈만
    /// 건너뛰고 나머지 빈의 수집은 계속된다.
    pub async fn query_with_rule(
        &self,
        pattern: &str,
        rule: &PrefixRule,
    ) -> Option<MetricSnapshot> {
        let beans = self.get_mbeans(pattern).await?;

        let mut merged = MetricSnapshot::new();
        for bean in &beans {
            let name = match ObjectName::parse(bean) {
                Ok(name) => name,
                Err(err) => {
                    warn!(bean = %bean, error = %err, "Skipping bean with unparseable name");
                    continue;
                }
            };

            let Some(body) = self.fetch("/mbean", &[("objectname", bean.as_str())]).await
            else {
                warn!(bean = %bean, "Bean query failed, skipping");
                continue;
            };

            let attributes = match parser::flatten_mbean(&body) {
                Ok(attributes) => attributes,
                Err(err) => {
                    warn!(bean = %bean, error = %err, "Unable to parse bean response");
                    continue;
                }
            };

            let prefix = rule.derive(&name);
            for (leaf, value) in attributes {
                let path = if prefix.is_empty() {
                    leaf
                } else {
                    format!("{}.{}", prefix, leaf)
                };
                merged.insert(path, value);
            }
        }

        Some(merged)
    }

    /// 이번 사이클의 질의 플랜
    ///
    /// 고정된 순서의 (패턴, prefix 규칙) 목록. 설정의 prefix override가
    /// 있으면 해당 항목의 규칙을 대체한다.
    fn query_plan(&self) -> Vec<(&'static str, PrefixRule)> {
        [
            (LOG_BEAN_PATTERN, PrefixRule::BeanPath),
            (GC_BEAN_PATTERN, PrefixRule::category("GarbageCollector")),
            (THREADING_BEAN_PATTERN, PrefixRule::category("Threading")),
        ]
        .into_iter()
        .map(
            |(pattern, rule)| match self.config.prefix_overrides.get(pattern) {
                Some(prefix) => (pattern, PrefixRule::Override(prefix.clone())),
                None => (pattern, rule),
            },
        )
        .collect()
    }

    /// 한 수집 사이클 실행
    ///
    /// 플랜의 도메인 질의를 순서대로 실행해 하나의 스냅샷으로 병합하고
    /// 싱크에 정확히 한 번 게시한다. 실패한 도메인의 메트릭은 이번
    /// 사이클에서 빠질 뿐, 사이클 자체는 항상 완료되고 항상 게시한다.
    pub async fn collect(&self, sink: &dyn MetricSink) {
        let mut snapshot = MetricSnapshot::new();

        for (pattern, rule) in self.query_plan() {
            match self.query_with_rule(pattern, &rule).await {
                Some(metrics) => {
                    snapshot.extend(metrics);
                }
                None => {
                    warn!(
                        pattern = %pattern,
                        "Domain query failed, metrics omitted from this cycle"
                    );
                }
            }
        }

        info!(
            metric_count = snapshot.len(),
            "Publishing collection cycle snapshot"
        );
        sink.publish(&snapshot);
    }
}
