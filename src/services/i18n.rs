//! UI string tables and text direction.
//!
//! Lookups never fail: a key without an entry in the active language comes
//! back unchanged, which is also how raw status values outside the known
//! lifecycle end up on screen.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Es,
    En,
    Fr,
    Ar,
}

/// One entry of the language selector.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageOption {
    pub code: &'static str,
    pub name: &'static str,
    pub active: bool,
}

impl Language {
    /// Selector order.
    pub const ALL: [Language; 4] = [Language::Es, Language::En, Language::Fr, Language::Ar];

    pub fn tag(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
            Language::Fr => "fr",
            Language::Ar => "ar",
        }
    }

    /// Native name shown in the selector.
    pub fn native_name(self) -> &'static str {
        match self {
            Language::Es => "Español",
            Language::En => "English",
            Language::Fr => "Français",
            Language::Ar => "العربية",
        }
    }

    /// Accepts bare tags and region-qualified ones (`fr-CA`, `en_US`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        Self::ALL.into_iter().find(|l| l.tag() == primary)
    }

    pub fn dir(self) -> &'static str {
        match self {
            Language::Ar => "rtl",
            _ => "ltr",
        }
    }

    pub fn translate(self, key: &str) -> String {
        self.lookup(key).unwrap_or(key).to_string()
    }

    fn lookup(self, key: &str) -> Option<&'static str> {
        self.table()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    }

    pub fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Language::Es => ES,
            Language::En => EN,
            Language::Fr => FR,
            Language::Ar => AR,
        }
    }

    /// The whole table as a JSON object, for `{{t.key}}` in templates.
    pub fn strings(self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .table()
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::from(*v)))
            .collect();
        serde_json::Value::Object(map)
    }

    pub fn options(self) -> Vec<LanguageOption> {
        Self::ALL
            .into_iter()
            .map(|l| LanguageOption {
                code: l.tag(),
                name: l.native_name(),
                active: l == self,
            })
            .collect()
    }

    /// Calendar date the way the language's default locale writes it.
    pub fn format_date(self, date: chrono::NaiveDate) -> String {
        match self {
            Language::En => date.format("%-m/%-d/%Y").to_string(),
            Language::Es => date.format("%-d/%-m/%Y").to_string(),
            Language::Fr | Language::Ar => date.format("%d/%m/%Y").to_string(),
        }
    }

    pub fn format_datetime(self, at: chrono::NaiveDateTime) -> String {
        match self {
            Language::En => at.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
            Language::Es => at.format("%-d/%-m/%Y, %-H:%M:%S").to_string(),
            Language::Fr => at.format("%d/%m/%Y %H:%M:%S").to_string(),
            Language::Ar => at.format("%-d/%-m/%Y, %-I:%M:%S %p").to_string(),
        }
    }
}

const ES: &[(&str, &str)] = &[
    ("login", "Iniciar Sesión"),
    ("email", "Correo electrónico"),
    ("password", "Contraseña"),
    ("dashboard", "Panel"),
    ("history", "Historial"),
    ("logout", "Cerrar Sesión"),
    ("orders", "Comandas"),
    ("placed", "Recibidas"),
    ("ack", "Confirmadas"),
    ("in_progress", "En Proceso"),
    ("ready", "Listas"),
    ("delivered", "Entregadas"),
    ("table", "Mesa"),
    ("notes", "Notas"),
    ("items", "Artículos"),
    ("error", "Error"),
    ("stale", "No se pudieron actualizar las comandas; se muestran los últimos datos."),
];

const EN: &[(&str, &str)] = &[
    ("login", "Login"),
    ("email", "Email"),
    ("password", "Password"),
    ("dashboard", "Dashboard"),
    ("history", "History"),
    ("logout", "Logout"),
    ("orders", "Orders"),
    ("placed", "Placed"),
    ("ack", "Acknowledged"),
    ("in_progress", "In Progress"),
    ("ready", "Ready"),
    ("delivered", "Delivered"),
    ("table", "Table"),
    ("notes", "Notes"),
    ("items", "Items"),
    ("error", "Error"),
    ("stale", "Orders could not be refreshed; showing the last known data."),
];

const FR: &[(&str, &str)] = &[
    ("login", "Connexion"),
    ("email", "E-mail"),
    ("password", "Mot de passe"),
    ("dashboard", "Tableau de bord"),
    ("history", "Historique"),
    ("logout", "Déconnexion"),
    ("orders", "Commandes"),
    ("placed", "Reçues"),
    ("ack", "Confirmées"),
    ("in_progress", "En cours"),
    ("ready", "Prêtes"),
    ("delivered", "Livrées"),
    ("table", "Table"),
    ("notes", "Notes"),
    ("items", "Articles"),
    ("error", "Erreur"),
    ("stale", "Impossible d'actualiser les commandes ; affichage des dernières données."),
];

const AR: &[(&str, &str)] = &[
    ("login", "تسجيل الدخول"),
    ("email", "البريد الإلكتروني"),
    ("password", "كلمة المرور"),
    ("dashboard", "لوحة التحكم"),
    ("history", "السجل"),
    ("logout", "تسجيل الخروج"),
    ("orders", "الطلبات"),
    ("placed", "مستلمة"),
    ("ack", "مؤكدة"),
    ("in_progress", "قيد التنفيذ"),
    ("ready", "جاهزة"),
    ("delivered", "مسلمة"),
    ("table", "طاولة"),
    ("notes", "ملاحظات"),
    ("items", "عناصر"),
    ("error", "خطأ"),
    ("stale", "تعذر تحديث الطلبات؛ يتم عرض آخر البيانات المعروفة."),
];
