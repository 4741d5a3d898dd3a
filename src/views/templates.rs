use handlebars::Handlebars;
use std::sync::Arc;

pub type Hbs = Arc<Handlebars<'static>>;

pub fn build_handlebars() -> Hbs {
    let mut hb = Handlebars::new();

    // Layout + pages
    hb.register_template_file("layouts/base", "templates/layouts/base.hbs")
        .expect("template layouts/base");

    hb.register_template_file("pages/login", "templates/pages/login.hbs")
        .expect("template pages/login");
    hb.register_template_file("pages/dashboard", "templates/pages/dashboard.hbs")
        .expect("template pages/dashboard");
    hb.register_template_file("pages/history", "templates/pages/history.hbs")
        .expect("template pages/history");
    hb.register_template_file("pages/not_found", "templates/pages/not_found.hbs")
        .expect("template pages/not_found");

    // Partial endpoints (also pushed over /events/orders)
    hb.register_template_file("partials/order_tabs", "templates/partials/order_tabs.hbs")
        .expect("template partials/order_tabs");

    for name in ["navbar", "language_selector", "order_card", "toast"] {
        let path = format!("templates/partials/{name}.hbs");
        let src = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{path}: {e}"));
        hb.register_partial(name, src)
            .unwrap_or_else(|e| panic!("register {name} partial: {e}"));
    }

    Arc::new(hb)
}
