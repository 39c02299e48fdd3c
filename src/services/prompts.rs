//! Prompt construction for theme and entity generation.
//!
//! Prompts are minijinja templates rendered with strict undefined behavior,
//! compiled once into a shared environment. Builders are pure: they read the
//! inputs they are given and return instruction text, never parsing what the
//! model answers.

use std::sync::OnceLock;

use minijinja::{Environment, UndefinedBehavior, context};

/// Instruction requiring a two-key JSON object, with few-shot examples and
/// style constraints. The opening line binds the theme to an entity, a
/// keyword, or nothing, in that order of preference.
const THEME_TEMPLATE: &str = r#"{% if entity %}「{{ keyword }}」に関連した「{{ entity }}」を必ずテーマの中心に据えた、明るく楽しい雑談テーマを1つ考えてください。{% elif keyword %}「{{ keyword }}」というキーワードに必ず関連した、明るく楽しい雑談テーマを1つ考えてください。{% else %}明るく楽しい雑談テーマを1つ考えてください。{% endif %}
形式は以下のJSON形式で返してください。
{
    "theme": "具体的な話題",
    "hint": "会話のきっかけ"
}
例:
{
    "theme": "夏の思い出",
    "hint": "子供の頃の夏休みの思い出や、最近の夏の楽しみ方を話してみよう"
}
{
    "theme": "映画館で頼む食べ物",
    "hint": "楽しい映画には外せない,美味しいグルメについて語ろう"
}
{
    "theme": "学生時代の失敗談",
    "hint": "思い出したくない黒歴史,今だから笑える失敗を思い出そう"
}
{
    "theme": "異世界に行ったら何をしたい？",
    "hint": "もし異世界に行ったら魔法使いとして旅に出る？街で商売して大儲け？"
}

以下の条件を厳守してください:
- 楽しくて盛り上がる話題
- 現実的でリアルなお題含む
- 恋愛や仕事、学校に関する話題含む
- 想像が膨らみやすい話題含む
- ユーモアがあるお題含む
- 暗い話題や重い話題は避ける
- 具体的で想像しやすいお題とヒント
- 今までに生成した以下のテーマとは被らないように: {{ seen_themes }}
"#;

/// Asks for exactly one proper noun, optionally excluding the entity the
/// model keeps repeating.
const ENTITY_TEMPLATE: &str = r#"「{{ keyword }}」に関連する具体的な固有名詞（キャラクター名、人名、作品名など）を1つだけ挙げてください。
名前だけを返してください。説明文や記号は不要です。
{% if avoid %}ただし「{{ avoid }}」は除外してください。{% endif %}"#;

fn env() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();
    ENV.get_or_init(|| {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template("theme", THEME_TEMPLATE).expect("theme template parses");
        env.add_template("entity", ENTITY_TEMPLATE).expect("entity template parses");
        env
    })
}

// Templates are compile-time constants exercised by unit tests, so a render
// failure is a programming bug; expect() is confined to this module.
fn render(name: &str, ctx: minijinja::Value) -> String {
    env()
        .get_template(name)
        .expect("template registered at init")
        .render(ctx)
        .expect("static template renders")
}

fn serialize_seen(seen: &[String]) -> String {
    if seen.is_empty() { "なし".to_string() } else { seen.join(", ") }
}

/// Theme prompt, bound to `keyword` when present, generic otherwise.
pub fn build_theme_prompt(keyword: Option<&str>, seen: &[String]) -> String {
    render(
        "theme",
        context! {
            entity => None::<&str>,
            keyword => keyword,
            seen_themes => serialize_seen(seen),
        },
    )
}

/// Entity prompt: exactly one concrete named entity related to `keyword`,
/// with an exclusion clause when `avoid` is set.
pub fn build_entity_prompt(keyword: &str, avoid: Option<&str>) -> String {
    render("entity", context! { keyword => keyword, avoid => avoid })
}

/// Theme prompt bound to a resolved entity, contextualized by the original
/// keyword.
pub fn build_theme_from_entity_prompt(entity: &str, keyword: &str, seen: &[String]) -> String {
    render(
        "theme",
        context! {
            entity => entity,
            keyword => keyword,
            seen_themes => serialize_seen(seen),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_theme_prompt_has_no_keyword_binding() {
        let prompt = build_theme_prompt(None, &[]);
        assert!(prompt.starts_with("明るく楽しい雑談テーマを1つ考えてください。"));
        assert!(prompt.contains("JSON形式"));
        assert!(prompt.contains("なし"));
    }

    #[test]
    fn keyword_theme_prompt_binds_the_keyword() {
        let prompt = build_theme_prompt(Some("映画"), &[]);
        assert!(prompt.starts_with("「映画」というキーワードに必ず関連した"));
    }

    #[test]
    fn seen_themes_are_embedded_comma_separated() {
        let seen = vec!["夏の思い出".to_string(), "黒歴史".to_string()];
        let prompt = build_theme_prompt(None, &seen);
        assert!(prompt.contains("夏の思い出, 黒歴史"));
        assert!(!prompt.contains("なし"));
    }

    #[test]
    fn entity_prompt_asks_for_one_proper_noun() {
        let prompt = build_entity_prompt("ドラゴンボール", None);
        assert!(prompt.contains("「ドラゴンボール」"));
        assert!(prompt.contains("固有名詞"));
        assert!(prompt.contains("1つだけ"));
        assert!(!prompt.contains("除外"));
    }

    #[test]
    fn entity_prompt_excludes_the_avoided_entity() {
        let prompt = build_entity_prompt("ドラゴンボール", Some("孫悟空"));
        assert!(prompt.contains("ただし「孫悟空」は除外してください。"));
    }

    #[test]
    fn entity_bound_theme_prompt_mentions_entity_and_keyword() {
        let prompt = build_theme_from_entity_prompt("孫悟空", "ドラゴンボール", &[]);
        assert!(prompt.starts_with("「ドラゴンボール」に関連した「孫悟空」"));
        assert!(prompt.contains("JSON形式"));
    }
}
