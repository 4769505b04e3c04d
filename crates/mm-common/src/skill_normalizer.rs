use std::collections::HashMap;
use std::sync::LazyLock;

use unicode_normalization::UnicodeNormalization;

/// Skill alias → canonical form. Lookups are O(1) and symmetric: two skills
/// are synonyms when they resolve to the same canonical entry.
static ALIAS_TO_CANONICAL: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let aliases: &[(&str, &[&str])] = &[
        // JavaScript ecosystem
        (
            "javascript",
            &["js", "java script", "ecmascript", "es6", "es2015", "vanilla js"],
        ),
        ("typescript", &["ts", "type script"]),
        ("nodejs", &["node.js", "node js", "node"]),
        // Frontend frameworks
        ("react", &["reactjs", "react.js", "react js", "react18"]),
        ("vue", &["vue.js", "vuejs", "vue js", "vue3"]),
        ("angular", &["angularjs", "angular.js", "angular2"]),
        ("svelte", &["sveltejs", "svelte.js", "sveltekit"]),
        ("nextjs", &["next.js", "next js", "next"]),
        ("nuxt", &["nuxtjs", "nuxt.js", "nuxt js"]),
        // Styling
        ("css", &["css3", "cascading style sheets"]),
        ("sass", &["scss"]),
        ("tailwind", &["tailwindcss", "tailwind css"]),
        // Backend frameworks
        ("spring", &["spring boot", "springboot", "spring framework"]),
        ("django", &["django rest framework", "drf"]),
        ("flask", &["python flask"]),
        ("express", &["express.js", "expressjs", "express js"]),
        ("fastapi", &["fast api"]),
        ("laravel", &["php laravel"]),
        ("rails", &["ruby on rails", "ror"]),
        // Databases
        ("postgresql", &["postgres", "pg", "postgre sql"]),
        ("mysql", &["my sql", "mariadb"]),
        ("mongodb", &["mongo", "mongo db"]),
        ("redis", &["redis cache"]),
        ("elasticsearch", &["elastic search", "elastic"]),
        // Cloud platforms
        ("aws", &["amazon web services", "amazon aws"]),
        ("gcp", &["google cloud platform", "google cloud"]),
        ("azure", &["microsoft azure", "ms azure"]),
        ("firebase", &["google firebase"]),
        // Languages
        ("python", &["python3", "py"]),
        ("java", &["java17", "openjdk"]),
        ("csharp", &["c#", "c sharp", ".net", "dotnet"]),
        ("cplusplus", &["c++", "cpp"]),
        ("golang", &["go", "go lang"]),
        ("rust", &["rust lang", "rustlang"]),
        ("php", &["php8"]),
        ("ruby", &["ruby lang"]),
        ("swift", &["ios swift", "swiftui"]),
        ("kotlin", &["kotlin jvm"]),
        // DevOps
        ("docker", &["docker container", "containers"]),
        ("kubernetes", &["k8s", "kube"]),
        ("terraform", &["infrastructure as code", "iac"]),
        ("git", &["github", "gitlab", "version control"]),
        ("cicd", &["ci/cd", "ci cd", "continuous integration"]),
        // Data & ML
        ("machinelearning", &["machine learning", "ml"]),
        ("ai", &["artificial intelligence"]),
        ("deeplearning", &["deep learning", "neural networks"]),
        ("tensorflow", &["tensor flow", "tf"]),
        ("pytorch", &["torch", "py torch"]),
        ("pandas", &["python pandas"]),
        ("sql", &["structured query language"]),
        // Mobile
        ("reactnative", &["react native", "react-native", "rn"]),
        ("flutter", &["dart flutter"]),
        // Design & marketing
        ("figma", &["figma design"]),
        ("uxdesign", &["ux", "ux design", "user experience"]),
        ("uidesign", &["ui", "ui design", "user interface design"]),
        ("seo", &["search engine optimization"]),
        ("copywriting", &["copy writing", "copywriter"]),
    ];

    let mut map = HashMap::new();
    for (canonical, alias_list) in aliases {
        map.insert(*canonical, *canonical);
        for alias in *alias_list {
            map.insert(*alias, *canonical);
        }
    }
    map
});

/// Tolerates separator variants (`React.js` / `react js` / `reactjs`).
static COMPACT_ALIAS_TO_CANONICAL: LazyLock<HashMap<String, &'static str>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    for (alias, canonical) in ALIAS_TO_CANONICAL.iter() {
        map.entry(compact_key(alias)).or_insert(*canonical);
    }

    map
});

fn compact_key(input: &str) -> String {
    input
        .nfkc()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '.' | '-' | '_' | '/' | ','))
        .collect()
}

/// Case- and width-folded skill string; the basis of an "exact" match.
pub fn fold_skill(skill: &str) -> String {
    skill
        .nfkc()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Canonical form from the synonym table, if the skill is known.
pub fn canonical_skill(skill: &str) -> Option<&'static str> {
    let folded = fold_skill(skill);
    if folded.is_empty() {
        return None;
    }

    ALIAS_TO_CANONICAL
        .get(folded.as_str())
        .copied()
        .or_else(|| COMPACT_ALIAS_TO_CANONICAL.get(&compact_key(&folded)).copied())
}

/// Bidirectional synonym check via the shared canonical entry.
pub fn are_synonyms(a: &str, b: &str) -> bool {
    match (canonical_skill(a), canonical_skill(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Folded, de-duplicated skill list, dropping blanks.
pub fn fold_skill_list(skills: &[String]) -> Vec<String> {
    let mut folded: Vec<String> = skills
        .iter()
        .map(|s| fold_skill(s))
        .filter(|s| !s.is_empty())
        .collect();
    folded.sort();
    folded.dedup();
    folded
}
