//! Leadership and followership type catalog
//!
//! A leader's type comes from three assessment dimensions, each scored 0-5.
//! A dimension counts as high at `HIGH_SCORE_THRESHOLD` or above, and the
//! high/low pattern across the three picks one of eight types.

use crate::prompt::LeadershipProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Scores at or above this are high
pub const HIGH_SCORE_THRESHOLD: f64 = 4.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LeadershipType {
    #[serde(rename = "참여코칭형")]
    ParticipativeCoaching,
    #[serde(rename = "참여실무형")]
    ParticipativePractical,
    #[serde(rename = "참여비전형")]
    ParticipativeVisionary,
    #[serde(rename = "참여친밀형")]
    ParticipativeRapport,
    #[serde(rename = "개별코칭형")]
    IndividualCoaching,
    #[serde(rename = "개별비전형")]
    IndividualVisionary,
    #[serde(rename = "개별친밀형")]
    IndividualRapport,
    #[serde(rename = "과도기형")]
    Transitional,
}

impl LeadershipType {
    pub const ALL: [LeadershipType; 8] = [
        LeadershipType::ParticipativeCoaching,
        LeadershipType::ParticipativePractical,
        LeadershipType::ParticipativeVisionary,
        LeadershipType::ParticipativeRapport,
        LeadershipType::IndividualCoaching,
        LeadershipType::IndividualVisionary,
        LeadershipType::IndividualRapport,
        LeadershipType::Transitional,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LeadershipType::ParticipativeCoaching => "참여코칭형",
            LeadershipType::ParticipativePractical => "참여실무형",
            LeadershipType::ParticipativeVisionary => "참여비전형",
            LeadershipType::ParticipativeRapport => "참여친밀형",
            LeadershipType::IndividualCoaching => "개별코칭형",
            LeadershipType::IndividualVisionary => "개별비전형",
            LeadershipType::IndividualRapport => "개별친밀형",
            LeadershipType::Transitional => "과도기형",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    pub fn info(self) -> LeadershipInfo {
        match self {
            LeadershipType::ParticipativeCoaching => LeadershipInfo::described(
                "공유 및 참여, 상호작용, 성장지향 모두 높음",
            ),
            LeadershipType::ParticipativePractical => LeadershipInfo::described(
                "공유 및 참여는 높으나, 상호작용과 성장지향이 낮음",
            ),
            LeadershipType::ParticipativeVisionary => LeadershipInfo::described(
                "공유 및 참여와 성장지향은 높으나, 상호작용이 낮음",
            ),
            LeadershipType::ParticipativeRapport => LeadershipInfo::described(
                "공유 및 참여와 상호작용은 높으나, 성장지향이 낮음",
            ),
            LeadershipType::IndividualCoaching => LeadershipInfo::described(
                "상호작용과 성장지향은 높으나, 공유 및 참여가 낮음",
            ),
            LeadershipType::IndividualVisionary => LeadershipInfo {
                description: "성장지향만 높고, 공유 및 참여와 상호작용이 낮음",
                strengths: Some(
                    "미래 비전과 성장에 강점. 새로운 관점으로 프레임을 바꾸지만 산출물 정의가 팀과 어긋나면 재작업 위험",
                ),
                best_situations: &[
                    "신사업/전략 기획",
                    "문제 재정의",
                    "혁신 아이디어 도출",
                    "방향 전환이 필요한 초기 단계 검증 시",
                ],
            },
            LeadershipType::IndividualRapport => LeadershipInfo::described(
                "상호작용만 높고, 공유 및 참여와 성장지향이 낮음",
            ),
            LeadershipType::Transitional => LeadershipInfo::described(
                "공유 및 참여, 상호작용, 성장지향 모두 낮음",
            ),
        }
    }

    /// Prompt-facing view of `info`
    pub fn profile(self) -> LeadershipProfile {
        let info = self.info();
        LeadershipProfile {
            description: info.description.to_string(),
            strengths: info.strengths.unwrap_or_default().to_string(),
            best_situations: info.best_situations.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl fmt::Display for LeadershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeadershipInfo {
    pub description: &'static str,
    pub strengths: Option<&'static str>,
    pub best_situations: &'static [&'static str],
}

impl LeadershipInfo {
    const fn described(description: &'static str) -> Self {
        Self {
            description,
            strengths: None,
            best_situations: &[],
        }
    }
}

/// Assessment scores on the three dimensions (0-5)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LeadershipScores {
    #[serde(rename = "공유및참여")]
    pub sharing_participation: f64,
    #[serde(rename = "상호작용")]
    pub interaction: f64,
    #[serde(rename = "성장지향")]
    pub growth_orientation: f64,
}

/// Map the high/low pattern of the three dimensions to a type
pub fn classify_leadership_type(scores: &LeadershipScores) -> LeadershipType {
    let sp = scores.sharing_participation >= HIGH_SCORE_THRESHOLD;
    let ia = scores.interaction >= HIGH_SCORE_THRESHOLD;
    let go = scores.growth_orientation >= HIGH_SCORE_THRESHOLD;

    match (sp, ia, go) {
        (true, true, true) => LeadershipType::ParticipativeCoaching,
        (true, false, false) => LeadershipType::ParticipativePractical,
        (true, false, true) => LeadershipType::ParticipativeVisionary,
        (true, true, false) => LeadershipType::ParticipativeRapport,
        (false, true, true) => LeadershipType::IndividualCoaching,
        (false, false, true) => LeadershipType::IndividualVisionary,
        (false, true, false) => LeadershipType::IndividualRapport,
        (false, false, false) => LeadershipType::Transitional,
    }
}

/// Catalog entry for a type label; `None` for unknown labels
pub fn get_leadership_info(label: &str) -> Option<LeadershipInfo> {
    LeadershipType::from_label(label).map(LeadershipType::info)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FollowershipType {
    Driver,
    Thinker,
    Supporter,
    Doer,
    Follower,
}

impl FollowershipType {
    pub const ALL: [FollowershipType; 5] = [
        FollowershipType::Driver,
        FollowershipType::Thinker,
        FollowershipType::Supporter,
        FollowershipType::Doer,
        FollowershipType::Follower,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FollowershipType::Driver => "Driver",
            FollowershipType::Thinker => "Thinker",
            FollowershipType::Supporter => "Supporter",
            FollowershipType::Doer => "Doer",
            FollowershipType::Follower => "Follower",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|t| t.label().eq_ignore_ascii_case(label))
    }

    pub fn description(self) -> &'static str {
        match self {
            FollowershipType::Driver => "팀원은 리더가 제안한 내용 뿐 아니라 내용을 발전시켜오는 적극적인 업무 참여 태도를 보인다. 문제가 발생할때에는 원인에 대한 분석 뿐만 아니라 해결책을 모색한다.",
            FollowershipType::Thinker => "한가지 일에 대한 몰입이 높은편이고 여러가지 일에 대해 정신 에너지를 전환하는 것을 어려워한다. 새로운 아이디어를 많이 내는 편이지만, 실행을 위한 행동은 느린편이다.",
            FollowershipType::Supporter => "리더의 업무 지시에 빠르게 순응하고 업무를 처리한다. 리더를 포함한 팀 구성원의 업무를 지원하는 역할을 편안해한다. 주도적으로 나서서 업무를 진행하는 것에 부담이 있는 편이라, 리더로서 팀원의 리더십 개발이 고민이 된다.",
            FollowershipType::Doer => "R&R이 분명할 경우 업무에 대한 이해가 빠르고 정확도 높게 업무를 처리한다. 다만 새로운 아이디어가 필요하거나 개념 수준에서 논의가 필요한 상황일 때 혼란스러워한다.",
            FollowershipType::Follower => "업무 동기가 떨어져 보이고, 업무 실수 및 업무 몰입도가 많이 떨어져 있다. 최근들어 이 팀원의 업무 몰입을 높이기 위해 어떻게 접근해야 할지에 대한 고민이 깊어졌다.",
        }
    }

    pub fn characteristics(self) -> &'static [&'static str] {
        match self {
            FollowershipType::Driver => &["적극적 참여", "문제 해결 지향", "발전적 사고"],
            FollowershipType::Thinker => &["높은 몰입도", "아이디어 생성", "실행 느림"],
            FollowershipType::Supporter => &["빠른 순응", "지원 역할 선호", "주도성 부족"],
            FollowershipType::Doer => &["정확한 실행", "명확한 R&R 선호", "개념 논의 어려움"],
            FollowershipType::Follower => &["낮은 동기", "낮은 몰입도", "업무 실수 증가"],
        }
    }
}

/// Raw assessment attached to an interpretation request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AssessmentData {
    #[serde(default)]
    pub scores: Option<LeadershipScores>,
    #[serde(default)]
    pub followership_types: Vec<String>,
}

impl AssessmentData {
    /// Lenient parse; a payload of the wrong shape is logged and ignored
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(value.clone()) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Ignoring malformed assessment data: {}", e);
                None
            }
        }
    }

    /// Known followership types in request order, unknown names dropped
    pub fn known_followership_types(&self) -> Vec<FollowershipType> {
        self.followership_types
            .iter()
            .filter_map(|name| {
                let parsed = FollowershipType::from_label(name);
                if parsed.is_none() {
                    warn!(followership_type = %name, "Unknown followership type");
                }
                parsed
            })
            .collect()
    }
}

/// Check a claimed type against the catalog and, when scores are given,
/// against the type they classify to. A score mismatch only warns.
pub fn validate_leadership_type(label: &str, assessment: Option<&AssessmentData>) -> bool {
    let Some(claimed) = LeadershipType::from_label(label) else {
        warn!(leadership_type = label, "Unknown leadership type");
        return false;
    };

    if let Some(scores) = assessment.and_then(|a| a.scores.as_ref()) {
        let classified = classify_leadership_type(scores);
        if classified != claimed {
            warn!(
                claimed = %claimed,
                classified = %classified,
                "Leadership type does not match assessment scores"
            );
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scores(sp: f64, ia: f64, go: f64) -> LeadershipScores {
        LeadershipScores {
            sharing_participation: sp,
            interaction: ia,
            growth_orientation: go,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(classify_leadership_type(&scores(4.5, 4.5, 4.5)), LeadershipType::ParticipativeCoaching);
        assert_eq!(classify_leadership_type(&scores(4.49, 4.49, 4.49)), LeadershipType::Transitional);
        assert_eq!(classify_leadership_type(&scores(4.49, 4.49, 4.5)), LeadershipType::IndividualVisionary);
    }

    #[test]
    fn test_every_pattern_maps_to_its_type() {
        let cases = [
            ((5.0, 1.0, 1.0), LeadershipType::ParticipativePractical),
            ((5.0, 1.0, 5.0), LeadershipType::ParticipativeVisionary),
            ((5.0, 5.0, 1.0), LeadershipType::ParticipativeRapport),
            ((1.0, 5.0, 5.0), LeadershipType::IndividualCoaching),
            ((1.0, 5.0, 1.0), LeadershipType::IndividualRapport),
            ((3.5, 3.8, 4.8), LeadershipType::IndividualVisionary),
        ];

        for ((sp, ia, go), expected) in cases {
            assert_eq!(classify_leadership_type(&scores(sp, ia, go)), expected, "{} {} {}", sp, ia, go);
        }
    }

    #[test]
    fn test_catalog_lookup() {
        for ty in LeadershipType::ALL {
            assert_eq!(LeadershipType::from_label(ty.label()), Some(ty));
            assert!(!ty.info().description.is_empty());
        }

        let info = get_leadership_info("개별비전형").unwrap();
        assert!(info.strengths.unwrap().starts_with("미래 비전과 성장에 강점"));
        assert_eq!(info.best_situations.len(), 4);

        assert!(get_leadership_info("참여코칭형").unwrap().strengths.is_none());
        assert!(get_leadership_info("ENTJ").is_none());
    }

    #[test]
    fn test_profile_carries_catalog_text() {
        let profile = LeadershipType::IndividualVisionary.profile();
        assert_eq!(profile.best_situations[0], "신사업/전략 기획");
        assert!(!profile.strengths.is_empty());

        let profile = LeadershipType::Transitional.profile();
        assert!(profile.strengths.is_empty());
        assert!(profile.best_situations.is_empty());
    }

    #[test]
    fn test_followership_lookup() {
        assert_eq!(FollowershipType::from_label("driver"), Some(FollowershipType::Driver));
        assert_eq!(FollowershipType::from_label("Boss"), None);
        assert_eq!(FollowershipType::Doer.characteristics().len(), 3);
    }

    #[test]
    fn test_assessment_parsing() {
        let data = AssessmentData::from_value(&json!({
            "scores": {"공유및참여": 3.5, "상호작용": 3.8, "성장지향": 4.8},
            "followership_types": ["Driver", "Boss", "doer"]
        }))
        .unwrap();

        assert_eq!(data.scores, Some(scores(3.5, 3.8, 4.8)));
        assert_eq!(
            data.known_followership_types(),
            vec![FollowershipType::Driver, FollowershipType::Doer]
        );

        assert!(AssessmentData::from_value(&json!({"scores": "high"})).is_none());
        assert_eq!(AssessmentData::from_value(&json!({})), Some(AssessmentData::default()));
    }

    #[test]
    fn test_validation() {
        let matching = AssessmentData {
            scores: Some(scores(3.5, 3.8, 4.8)),
            followership_types: Vec::new(),
        };

        assert!(validate_leadership_type("개별비전형", Some(&matching)));
        assert!(validate_leadership_type("참여코칭형", Some(&matching)));
        assert!(validate_leadership_type("과도기형", None));
        assert!(!validate_leadership_type("ENTJ", Some(&matching)));
    }
}
