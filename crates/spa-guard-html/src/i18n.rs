// Copyright (c) SPA Guard Authors.
// Licensed under the MIT License.

//! The built-in translation table (§3 `TranslationTable`) and per-language
//! overrides supplied to the cache builder.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One language's fallback-template strings.
///
/// `rtl` is `None` rather than `false` so a user override that only sets,
/// say, `heading` does not accidentally flip a built-in RTL language back to
/// left-to-right when merged (§4.J "field-level override").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub heading: Option<String>,
    pub message: Option<String>,
    pub reload: Option<String>,
    pub try_again: Option<String>,
    pub loading: Option<String>,
    pub retrying: Option<String>,
    pub rtl: Option<bool>,
}

impl TranslationRecord {
    fn merge(&self, overrides: &TranslationRecord) -> Self {
        Self {
            heading: overrides.heading.clone().or_else(|| self.heading.clone()),
            message: overrides.message.clone().or_else(|| self.message.clone()),
            reload: overrides.reload.clone().or_else(|| self.reload.clone()),
            try_again: overrides.try_again.clone().or_else(|| self.try_again.clone()),
            loading: overrides.loading.clone().or_else(|| self.loading.clone()),
            retrying: overrides.retrying.clone().or_else(|| self.retrying.clone()),
            rtl: overrides.rtl.or(self.rtl),
        }
    }
}

fn record(heading: &str, message: &str, reload: &str, try_again: &str, loading: &str, retrying: &str, rtl: bool) -> TranslationRecord {
    TranslationRecord {
        heading: Some(heading.to_string()),
        message: Some(message.to_string()),
        reload: Some(reload.to_string()),
        try_again: Some(try_again.to_string()),
        loading: Some(loading.to_string()),
        retrying: Some(retrying.to_string()),
        rtl: Some(rtl),
    }
}

/// Built-in translations, keyed by lowercase lang-tag. This is a closed
/// enumeration (§3); user tables only ever override entries in this set or
/// add entirely new ones, they never remove a built-in.
fn builtins() -> BTreeMap<String, TranslationRecord> {
    let mut table = BTreeMap::new();
    table.insert(
        "en".to_string(),
        record(
            "Something went wrong",
            "We couldn't load part of this page. Reloading usually fixes it.",
            "Reload",
            "Try again",
            "Loading…",
            "Reconnecting…",
            false,
        ),
    );
    table.insert(
        "ko".to_string(),
        record(
            "문제가 발생했습니다",
            "페이지 일부를 불러오지 못했습니다. 새로고침하면 대부분 해결됩니다.",
            "새로고침",
            "다시 시도",
            "불러오는 중…",
            "재연결 중…",
            false,
        ),
    );
    table.insert(
        "ja".to_string(),
        record(
            "問題が発生しました",
            "ページの一部を読み込めませんでした。再読み込みすると解決することがあります。",
            "再読み込み",
            "再試行",
            "読み込み中…",
            "再接続中…",
            false,
        ),
    );
    table.insert(
        "zh".to_string(),
        record(
            "出现了一些问题",
            "无法加载此页面的部分内容,刷新通常可以解决。",
            "刷新",
            "重试",
            "加载中…",
            "正在重新连接…",
            false,
        ),
    );
    table.insert(
        "ar".to_string(),
        record(
            "حدث خطأ ما",
            "تعذر تحميل جزء من هذه الصفحة. عادةً ما تؤدي إعادة التحميل إلى حل المشكلة.",
            "إعادة التحميل",
            "إعادة المحاولة",
            "جارٍ التحميل…",
            "جارٍ إعادة الاتصال…",
            true,
        ),
    );
    table.insert(
        "he".to_string(),
        record(
            "משהו השתבש",
            "לא הצלחנו לטעון חלק מהדף הזה. רענון הדף בדרך כלל פותר את הבעיה.",
            "רענן",
            "נסה שוב",
            "טוען…",
            "מתחבר מחדש…",
            true,
        ),
    );
    table.insert(
        "de".to_string(),
        record(
            "Etwas ist schiefgelaufen",
            "Ein Teil dieser Seite konnte nicht geladen werden. Neu laden hilft meistens.",
            "Neu laden",
            "Erneut versuchen",
            "Wird geladen…",
            "Verbindung wird wiederhergestellt…",
            false,
        ),
    );
    table.insert(
        "ru".to_string(),
        record(
            "Что-то пошло не так",
            "Не удалось загрузить часть страницы. Обычно помогает перезагрузка.",
            "Перезагрузить",
            "Повторить",
            "Загрузка…",
            "Переподключение…",
            false,
        ),
    );
    table.insert(
        "es".to_string(),
        record(
            "Algo salió mal",
            "No pudimos cargar parte de esta página. Recargarla suele solucionarlo.",
            "Recargar",
            "Reintentar",
            "Cargando…",
            "Reconectando…",
            false,
        ),
    );
    table.insert(
        "fa".to_string(),
        record(
            "مشکلی پیش آمد",
            "بخشی از این صفحه بارگذاری نشد. معمولاً بارگذاری مجدد مشکل را برطرف می‌کند.",
            "بارگذاری مجدد",
            "تلاش دوباره",
            "در حال بارگذاری…",
            "در حال اتصال مجدد…",
            true,
        ),
    );
    table
}

/// The merged translation table: built-ins overridden field-by-field by
/// user-supplied records, plus any entirely new language the user added.
#[derive(Debug, Clone)]
pub struct TranslationTable {
    entries: BTreeMap<String, TranslationRecord>,
}

impl TranslationTable {
    /// Merges `overrides` into the built-in set.
    #[must_use]
    pub fn merged(overrides: &BTreeMap<String, TranslationRecord>) -> Self {
        let mut entries = builtins();
        for (lang, over) in overrides {
            let key = lang.to_ascii_lowercase();
            let merged = match entries.get(&key) {
                Some(existing) => existing.merge(over),
                None => over.clone(),
            };
            entries.insert(key, merged);
        }
        Self { entries }
    }

    /// The built-in table with no user overrides.
    #[must_use]
    pub fn builtin() -> Self {
        Self { entries: builtins() }
    }

    /// Every language this table has an entry for, in stable (sorted) order.
    #[must_use]
    pub fn languages(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Looks up `lang` (case-insensitive).
    #[must_use]
    pub fn get(&self, lang: &str) -> Option<&TranslationRecord> {
        self.entries.get(&lang.to_ascii_lowercase())
    }

    /// `true` if `lang` resolves to exactly the built-in record, i.e. the
    /// caller supplied no override for it (§4.J "English with no custom
    /// English overrides is a no-op").
    #[must_use]
    pub fn is_unmodified_builtin(&self, lang: &str) -> bool {
        let key = lang.to_ascii_lowercase();
        match (self.entries.get(&key), builtins().get(&key)) {
            (Some(merged), Some(builtin)) => merged == builtin,
            _ => false,
        }
    }
}
