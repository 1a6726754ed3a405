//! MX4J XML 응답 파서
//!
//! 관리 엔드포인트가 반환하는 두 가지 문서를 파싱합니다.
//! `/serverbydomain` 빈 목록 문서와 `/mbean` 빈 상세 문서입니다.

use roxmltree::{Document, Node};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{CollectResult, CollectorError};

/// Kafka 레거시 stat 빈이 전체 stat 맵을 감싸는 속성 이름.
/// 이 이름의 복합 속성은 경로 세그먼트를 만들지 않는다.
const VALUE_ATTRIBUTE: &str = "Value";

/// 숫자 타입 종류 - XML `type` 문자열 기반의 닫힌 집합
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    /// 32비트 정수 (`int`)
    Int32,
    /// 64비트 정수 (`long`)
    Int64,
    /// 부동소수점 (`double`, `float`)
    Float64,
}

impl NumericKind {
    /// XML `type` 문자열을 숫자 종류로 매핑
    ///
    /// 알 수 없는 타입 문자열은 `None` - 해당 leaf는 건너뛴다.
    /// `java.lang.Object`는 부동소수점으로 읽는다.
    pub fn from_type(type_name: &str) -> Option<Self> {
        match type_name {
            "int" | "java.lang.Integer" => Some(NumericKind::Int32),
            "long" | "java.lang.Long" => Some(NumericKind::Int64),
            "double" | "float" | "java.lang.Double" | "java.lang.Float" | "java.lang.Object" => {
                Some(NumericKind::Float64)
            }
            _ => None,
        }
    }

    /// 원시 문자열 값을 선언된 종류로 강제 변환
    ///
    /// 파싱에 실패하면 `None` - 해당 leaf는 건너뛴다.
    pub fn coerce(&self, raw: &str) -> Option<MetricValue> {
        let raw = raw.trim();
        match self {
            NumericKind::Int32 => raw.parse().ok().map(MetricValue::Int),
            NumericKind::Int64 => raw.parse().ok().map(MetricValue::Long),
            NumericKind::Float64 => raw.parse().ok().map(MetricValue::Double),
        }
    }
}

/// 메트릭 값 - 평탄화 이후에는 항상 숫자
///
/// 소스 속성이 선언한 숫자 타입이 그대로 보존된다. 정수는 정수로,
/// 부동소수점은 부동소수점으로 유지된다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// 32비트 정수
    Int(i32),
    /// 64비트 정수
    Long(i64),
    /// 부동소수점
    Double(f64),
}

impl MetricValue {
    /// 숫자로 변환
    ///
    /// # Precision Warning
    /// When converting `Long(i64)` to `f64`, precision loss may occur
    /// for values > 2^53 (9,007,199,254,740,992).
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Int(i) => f64::from(*i),
            MetricValue::Long(i) => {
                if i.abs() > (1i64 << 53) {
                    tracing::warn!(
                        value = i,
                        "Large integer may lose precision when converted to f64"
                    );
                }
                *i as f64
            }
            MetricValue::Double(f) => *f,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Int(i) => write!(f, "{}", i),
            MetricValue::Long(i) => write!(f, "{}", i),
            MetricValue::Double(v) => write!(f, "{}", v),
        }
    }
}

/// 속성 트리 - 스칼라 또는 중첩 row들로 이루어진 복합 값
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeNode {
    /// 선언된 타입과 원시 값을 가진 스칼라
    Scalar {
        /// 선언된 숫자 종류
        kind: NumericKind,
        /// 원시 문자열 값
        raw: String,
    },
    /// (sub-key, 자식 노드) 목록
    Composite(Vec<(String, AttributeNode)>),
}

impl AttributeNode {
    /// 노드를 평탄화해 `out`에 leaf 이름 → 값을 쌓는다
    ///
    /// `path`는 지금까지 쌓인 dotted 경로. 복합 노드는 sub-key를
    /// `.`으로 이어 붙이고, 스칼라는 선언된 타입으로 강제 변환된다.
    /// 변환에 실패한 leaf는 조용히 건너뛴다.
    pub fn flatten_into(&self, path: Option<&str>, out: &mut BTreeMap<String, MetricValue>) {
        match self {
            AttributeNode::Scalar { kind, raw } => {
                let Some(path) = path else { return };
                if let Some(value) = kind.coerce(raw) {
                    out.insert(path.to_string(), value);
                }
            }
            AttributeNode::Composite(entries) => {
                for (key, child) in entries {
                    let child_path = match path {
                        Some(p) => format!("{}.{}", p, key),
                        None => key.clone(),
                    };
                    child.flatten_into(Some(&child_path), out);
                }
            }
        }
    }
}

/// MBean ObjectName 구조
///
/// property 순서가 경로 유도에 쓰이므로 순서를 보존한다.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectName {
    /// 도메인 (예: "java.lang")
    pub domain: String,
    /// 순서가 보존된 property 목록
    properties: Vec<(String, String)>,
}

impl ObjectName {
    /// ObjectName 문자열 파싱
    ///
    /// # Limitations
    /// - Quoted keys/values are NOT fully supported
    pub fn parse(s: &str) -> CollectResult<Self> {
        let parts: Vec<&str> = s.splitn(2, ':').collect();
        if parts.len() != 2 {
            return Err(CollectorError::InvalidObjectName(s.to_string()));
        }

        let domain = parts[0].to_string();
        let mut properties = Vec::new();

        for prop in parts[1].split(',') {
            let kv: Vec<&str> = prop.splitn(2, '=').collect();
            if kv.len() == 2 {
                properties.push((kv[0].to_string(), kv[1].to_string()));
            }
        }

        Ok(Self { domain, properties })
    }

    /// property 값 조회
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 빈 이름에서 메트릭 경로 유도
    ///
    /// `type`과 `name` property는 값만, 나머지 property는 `key.value`로
    /// 이어 붙인다. 예:
    /// `kafka:type=kafka.logs.mytopic-1` → `kafka.logs.mytopic-1`,
    /// `kafka.log:type=Log,name=LogStartOffset,topic=packetbeat,partition=0`
    /// → `Log.LogStartOffset.topic.packetbeat.partition.0`
    pub fn metric_path(&self) -> String {
        let mut segments: Vec<&str> = Vec::new();
        for (key, value) in &self.properties {
            if key != "type" && key != "name" {
                segments.push(key);
            }
            segments.push(value);
        }
        segments.join(".")
    }
}

/// 빈 목록 문서에서 ObjectName 집합 추출
///
/// `<MBean objectname="..."/>` 요소마다 하나씩. 문서 안에 같은 이름이
/// 반복돼도 집합 의미론으로 중복이 제거된다. 빈 문서는 빈 집합이다.
pub fn parse_bean_names(xml: &str) -> CollectResult<BTreeSet<String>> {
    let doc = Document::parse(xml)?;

    let mut names = BTreeSet::new();
    for mbean in doc.descendants().filter(|n| n.has_tag_name("MBean")) {
        if let Some(objectname) = mbean.attribute("objectname") {
            names.insert(objectname.to_string());
        }
    }

    Ok(names)
}

/// 빈 상세 문서를 leaf 이름 → 값 매핑으로 평탄화
///
/// 숫자가 아닌 타입의 속성과 값 파싱에 실패한 속성은 개별적으로
/// 건너뛴다. 나머지 속성의 평탄화는 계속된다. 잘 구성된 빈 문서는
/// 빈 매핑을 반환한다. 에러는 문서 자체가 XML로 파싱되지 않을 때뿐이다.
pub fn flatten_mbean(xml: &str) -> CollectResult<BTreeMap<String, MetricValue>> {
    let doc = Document::parse(xml)?;

    let mut metrics = BTreeMap::new();
    for attribute in doc.descendants().filter(|n| n.has_tag_name("Attribute")) {
        let Some(name) = attribute.attribute("name") else {
            continue;
        };

        match attribute_node(&attribute) {
            Some(node @ AttributeNode::Scalar { .. }) => {
                node.flatten_into(Some(name), &mut metrics);
            }
            Some(node @ AttributeNode::Composite(_)) => {
                let base = (name != VALUE_ATTRIBUTE).then_some(name);
                node.flatten_into(base, &mut metrics);
            }
            None => {}
        }
    }

    Ok(metrics)
}

/// 요소 하나를 속성 트리로 변환
///
/// `<Row>` 자식이 있으면 복합, 없으면 `type`/`value`를 가진 스칼라.
/// 타입이 없거나 숫자 타입이 아니면 `None`.
fn attribute_node(node: &Node) -> Option<AttributeNode> {
    let rows: Vec<Node> = node
        .children()
        .filter(|c| c.is_element() && c.has_tag_name("Row"))
        .collect();

    if rows.is_empty() {
        let kind = NumericKind::from_type(node.attribute("type")?)?;
        let raw = node.attribute("value")?;
        return Some(AttributeNode::Scalar {
            kind,
            raw: raw.to_string(),
        });
    }

    let mut entries = Vec::new();
    for row in rows {
        let Some(key) = row.attribute("key") else {
            continue;
        };
        if let Some(child) = attribute_node(&row) {
            entries.push((key.to_string(), child));
        }
    }

    Some(AttributeNode::Composite(entries))
}
