use std::sync::LazyLock;

use crate::config::ConfigError;

/// One entry of the built-in category table: JSON key, display name shown to
/// the roulette front end, and the keywords used for name-line matching and
/// auto-detection voting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub key: String,
    pub display_name: String,
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(key: &str, display_name: &str, keywords: &[&str]) -> Self {
        Category {
            key: key.to_string(),
            display_name: display_name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

static BUILTIN: LazyLock<Vec<Category>> = LazyLock::new(|| {
    vec![
        Category::new("macaron", "마카롱", &["마카롱"]),
        Category::new(
            "icecream",
            "아이스크림",
            &[
                "아이스크림", "아이스밀크", "저당", "제로", "바닐라", "초코",
                "딸기", "복숭아", "멜론", "모나카", "초코바", "생요거트바",
            ],
        ),
        Category::new(
            "lowsugar_icecream",
            "저당 아이스크림",
            &["저당", "제로", "아이스크림", "아이스밀크"],
        ),
        Category::new("dessert", "디저트", &["디저트", "케이크", "푸딩", "젤리"]),
        Category::new(
            "snack",
            "과자",
            &[
                "과자", "스낵", "쿠키", "비스킷", "웨이퍼", "파이", "초코파이",
                "브라우니", "사브레", "크렘", "칙촉", "메론킥", "뉴트리오코",
                "마켓오", "구운김", "오리온", "스낵365", "농심", "배스킨라빈스",
                "롯데웰푸드", "해태제과",
            ],
        ),
        Category::new("frozen", "냉동식품", &["냉동"]),
        Category::new("drink", "음료", &["음료"]),
        Category::new("chicken", "치킨", &["치킨"]),
        Category::new("pizza", "피자", &["피자"]),
        Category::new("coffee", "커피", &["커피"]),
        Category::new("bread", "빵", &["빵"]),
    ]
});

pub fn builtin() -> &'static [Category] {
    &BUILTIN
}

pub fn resolve(key: &str) -> Result<Category, ConfigError> {
    BUILTIN
        .iter()
        .find(|c| c.key == key)
        .cloned()
        .ok_or_else(|| ConfigError::UnknownCategory(key.to_string()))
}

/// Keyword-frequency voting over the built-in table. Returns `None` when no
/// keyword occurs at all, which switches the parser to length-only name
/// matching.
pub fn detect(text: &str) -> Option<Category> {
    let lower = text.to_lowercase();
    let mut best: Option<(&Category, usize)> = None;
    for category in BUILTIN.iter() {
        let score: usize = category
            .keywords
            .iter()
            .map(|kw| lower.matches(kw.to_lowercase().as_str()).count())
            .sum();
        if score > 0 && best.map(|(_, s)| score > s).unwrap_or(true) {
            best = Some((category, score));
        }
    }
    best.map(|(c, _)| c.clone())
}
