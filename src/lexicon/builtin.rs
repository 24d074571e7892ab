//! Built-in Korean leadership-coaching vocabulary
//!
//! Static keyword lists — zero allocation until a `Lexicon` is built from them.

pub const VERSION: &str = "ko-leadership-2024.1";

/// Leadership / team vocabulary. Any hit keeps a question on-topic.
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "팀", "리더", "직원", "부하", "상사", "회의", "업무", "프로젝트",
    "성과", "목표", "관리", "소통", "커뮤니케이션", "의사결정",
    "갈등", "동기부여", "코칭", "피드백", "1on1", "조직", "해고", "이직",
];

// Off-topic categories, listed in scan order
pub const OFFTOPIC_WEATHER: &[&str] = &["날씨", "비", "눈", "맑", "흐림", "온도", "더워", "추워"];
pub const OFFTOPIC_FOOD: &[&str] = &["점심", "저녁", "아침", "먹을", "맛집", "음식", "메뉴"];
pub const OFFTOPIC_TECH: &[&str] = &["컴퓨터", "프로그램", "버그", "설치", "고장", "인터넷", "와이파이"];
pub const OFFTOPIC_MEDICAL: &[&str] = &["병원", "약", "의사", "진료", "우울증", "치료", "증상", "아파"];
pub const OFFTOPIC_LEGAL: &[&str] = &[
    "법", "소송", "계약서", "변호사", "법적", "문제 없나", "문제없나", "법률",
];
pub const OFFTOPIC_META: &[&str] = &[
    "서비스", "ai", "인공지능", "유료", "가격", "요금", "개인정보", "뭐하는", "뭐 하는",
];
pub const OFFTOPIC_DAILY: &[&str] = &["취미", "주식", "재테크", "운동", "영화", "드라마"];
pub const OFFTOPIC_NONSENSE: &[&str] = &["1+1", "asdf", "how are you", "??"];

// Traits
pub const GREETING_PREFIXES: &[&str] = &["안녕", "하이", "헬로", "반갑"];
pub const GREETING_ADJECTIVE: &str = "좋은";
pub const TIME_OF_DAY_WORDS: &[&str] = &["아침", "저녁", "오후", "하루", "주말"];
pub const INTERROGATIVE_WORDS: &[&str] = &["어떻게", "어떡", "방법", "뭐", "무엇"];
pub const INTERROGATIVE_SUFFIXES: &[&str] = &["죠", "나요", "을까요"];
pub const WELLBEING_EXCEPTIONS: &[&str] = &["지내", "어때", "괜찮", "잘 있", "건강", "안녕"];
pub const DECLARATIVE_SUFFIX: &str = "요";
pub const POLITE_ENDINGS: &[&str] = &["요.", "어요"];
pub const COMPLEXITY_MARKERS: &[char] = &['A', 'B', 'C', '그', '또'];

// Emotion
pub const FRUSTRATED: &[&str] = &[
    "답답", "힘들", "어렵", "막막", "모르겠", "지치", "지쳐", "화나", "불안", "두렵", "걱정", "포기",
];
pub const RESISTANT: &[&str] = &[
    "이미", "해봤", "안 됐", "안 돼", "소용없", "안 될", "그런데", "하지만", "어차피",
];
pub const POSITIVE: &[&str] = &["효과", "좋았", "도움", "감사", "성공", "잘 됐", "해결"];
pub const URGENT: &[&str] = &["당장", "급하", "내일", "오늘", "지금 바로"];
/// "Can't figure it out" / "giving up" sub-signal of frustration
pub const DESPAIR: &[&str] = &["모르겠", "포기"];

// Engagement: emotional investment
pub const EMOTIONAL_HIGH: &[&str] = &["힘들", "막막", "답답", "불안", "혼란", "스트레스", "갈등", "고통"];
pub const EMOTIONAL_MEDIUM: &[&str] = &["고민", "어려움", "어렵", "걱정", "문제", "부담"];
pub const EMOTIONAL_LOW: &[&str] = &["어떻게", "모르겠", "잘 안", "안 될 때", "조언", "어색"];

// Engagement: action intent
pub const ACTION_HIGH: &[&str] = &["실행", "실천", "시작", "바로", "당장", "오늘", "내일"];
pub const ACTION_MEDIUM: &[&str] = &["해보고 싶", "시도해보", "적용해보", "바꿔보", "해야"];
pub const ACTION_LOW: &[&str] = &["개선", "발전", "성장", "변화", "계획", "준비", "하면"];

// Engagement: topic maturity
pub const ADVANCED_HIGH: &[&str] = &["조직 개편", "전략 수립", "비전 설정", "문화 혁신", "성과 체계"];
pub const ADVANCED_MEDIUM: &[&str] = &[
    "팀 갈등", "조직 문화", "성과 관리", "성과 평가", "리더십 개발", "소통", "면담",
];
pub const ADVANCED_LOW: &[&str] = &[
    "경력", "커리어", "승진", "전략", "비전", "목표", "코칭", "멘토링", "1:1", "팀원", "팀", "업무", "지시",
];

/// Elaboration, causal, quantifier and before/after patterns
pub const STRUCTURAL_PATTERNS: &[&str] = &[
    r"예를 들어",
    r"왜냐하면",
    r"사실은",
    r"\d+명",
    r"\d+년",
    r"처음에는.*지금은",
];
