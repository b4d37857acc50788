//! 猫咪档案数据模型

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::personality::lookup_personality;

/// 属性取值范围
pub const ATTRIBUTE_MIN: u8 = 1;
pub const ATTRIBUTE_MAX: u8 = 20;

/// MBTI 人格类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalityType {
    /// 四字母代码，如 "INFJ"
    pub code: String,
    /// 标题，如 "The Advocate"
    #[serde(default)]
    pub title: String,
}

impl PersonalityType {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
        }
    }

    /// 兜底人格
    pub fn fallback() -> Self {
        Self::new("ISFP", "The Adventurer")
    }

    /// MBTI 表中的一句话描述
    pub fn description(&self) -> Option<&'static str> {
        lookup_personality(&self.code).map(|p| p.description)
    }

    /// 代码转大写并去除空白；标题缺失时从 MBTI 表补全
    pub fn normalized(self) -> Option<Self> {
        let code = self.code.trim().to_uppercase();
        if code.is_empty() {
            return None;
        }
        let title = match self.title.trim() {
            "" => lookup_personality(&code)
                .map(|p| p.title.to_string())
                .unwrap_or_default(),
            title => title.to_string(),
        };
        Some(Self { code, title })
    }
}

/// D&D 六项属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DndAttributes {
    pub strength: u8,
    pub dexterity: u8,
    pub constitution: u8,
    pub intelligence: u8,
    pub wisdom: u8,
    pub charisma: u8,
}

impl DndAttributes {
    /// 兜底属性：敏捷 10-19，其余 5-14
    pub fn random_fallback<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            strength: rng.gen_range(5..15),
            dexterity: rng.gen_range(10..20),
            constitution: rng.gen_range(5..15),
            intelligence: rng.gen_range(5..15),
            wisdom: rng.gen_range(5..15),
            charisma: rng.gen_range(5..15),
        }
    }

    /// 固定兜底属性
    pub fn fixed_fallback() -> Self {
        Self {
            strength: 10,
            dexterity: 15,
            constitution: 12,
            intelligence: 14,
            wisdom: 13,
            charisma: 11,
        }
    }

    /// 从模型输出解析；六项必须都是数字，取整后截断到 [1, 20]
    pub fn from_value(value: &Value) -> Option<Self> {
        let score = |field: &str| -> Option<u8> {
            let raw = value.get(field)?.as_f64()?;
            if !raw.is_finite() {
                return None;
            }
            Some(raw.round().clamp(ATTRIBUTE_MIN as f64, ATTRIBUTE_MAX as f64) as u8)
        };

        Some(Self {
            strength: score("strength")?,
            dexterity: score("dexterity")?,
            constitution: score("constitution")?,
            intelligence: score("intelligence")?,
            wisdom: score("wisdom")?,
            charisma: score("charisma")?,
        })
    }

    /// 按固定顺序列出 (名称, 分值)
    pub fn entries(&self) -> [(&'static str, u8); 6] {
        [
            ("strength", self.strength),
            ("dexterity", self.dexterity),
            ("constitution", self.constitution),
            ("intelligence", self.intelligence),
            ("wisdom", self.wisdom),
            ("charisma", self.charisma),
        ]
    }
}

/// 时间线事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// 年龄标签，如 "6 months"
    pub age: String,
    pub description: String,
}

impl TimelineEvent {
    pub fn new(age: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            age: age.into(),
            description: description.into(),
        }
    }

    /// 从模型输出解析单个事件；字段缺失或为空时丢弃
    pub fn from_value(value: &Value) -> Option<Self> {
        let field = |name: &str| -> Option<String> {
            let text = match value.get(name)? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some(text).filter(|t| !t.is_empty())
        };
        Some(Self::new(field("age")?, field("description")?))
    }

    /// 通用兜底时间线
    pub fn default_timeline(name: &str) -> Vec<Self> {
        vec![
            Self::new("Birth", format!("{} was born into the world.", name)),
            Self::new(
                "3 months",
                "Started exploring around and developing personality traits.",
            ),
            Self::new(
                "6 months",
                "Gained independence and learned important survival skills.",
            ),
            Self::new(
                "1 year",
                "Fully developed into a young adult cat with established habits.",
            ),
            Self::new(
                "Present",
                "Living the current chapter of life with confidence and character.",
            ),
        ]
    }
}

/// 客户端持有的猫咪档案，随各生成步骤逐步填充
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatProfile {
    pub name: Option<String>,
    pub personality_type: Option<PersonalityType>,
    pub dnd_attributes: Option<DndAttributes>,
    pub backstory: String,
    pub timeline: Vec<TimelineEvent>,
}
