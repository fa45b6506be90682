//! Sample prompts seeded on first use, bucketed by locale.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultBucket {
    Korean,
    Other,
}

/// Default prompt lists. A bucket without an entry seeds nothing.
pub const DEFAULT_PROMPTS: &[(DefaultBucket, &[&str])] = &[
    (
        DefaultBucket::Korean,
        &[
            "(샘플) 다음 텍스트를 {언어}로 번역해주세요:\n{텍스트}",
            "(샘플) {문제 상황}에서 {선택지1}, {선택지2} 중 하나를 선택하는 데 도움을 주세요. 각 선택의 장단점을 비교해주세요.",
            "(샘플) {제품명}의 {타겟 시장}을 위한 효과적인 마케팅 전략을 작성해주세요.\n주요 목표는 {목표}입니다.",
        ],
    ),
    (
        DefaultBucket::Other,
        &[
            "(Sample) Please translate the following text into {language}:\n{text}",
            "(Sample) Help me choose between {option 1} and {option 2} in {situation}. Compare the pros and cons of each option.",
            "(Sample) Write an effective marketing strategy for {product name} targeting {target market}.\nThe main goal is {goal}.",
        ],
    ),
];

impl DefaultBucket {
    /// Korean when the primary language subtag is `ko`.
    pub fn for_locale(tag: &str) -> Self {
        let primary = tag.split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("ko") {
            DefaultBucket::Korean
        } else {
            DefaultBucket::Other
        }
    }

    pub fn prompts(self) -> Vec<String> {
        DEFAULT_PROMPTS
            .iter()
            .find(|(bucket, _)| *bucket == self)
            .map(|(_, prompts)| prompts.iter().map(|prompt| prompt.to_string()).collect())
            .unwrap_or_default()
    }
}

pub fn default_prompts(locale: &str) -> Vec<String> {
    DefaultBucket::for_locale(locale).prompts()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_korean_variants() {
        for tag in ["ko", "ko-KR", "KO-kr", "ko_KR"] {
            assert_eq!(DefaultBucket::Korean, DefaultBucket::for_locale(tag), "{}", tag);
        }
    }

    #[test]
    fn test_everything_else_is_other() {
        for tag in ["en-US", "en", "ja-JP", "kok", ""] {
            assert_eq!(DefaultBucket::Other, DefaultBucket::for_locale(tag), "{}", tag);
        }
    }

    #[test]
    fn test_every_bucket_has_three_prompts() {
        for bucket in [DefaultBucket::Korean, DefaultBucket::Other] {
            assert_eq!(3, bucket.prompts().len());
        }
        assert!(default_prompts("ko-KR")[0].starts_with("(샘플)"));
        assert!(default_prompts("en-US")[0].starts_with("(Sample)"));
    }
}
