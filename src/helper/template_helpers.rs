use tera::Tera;

/// Admin page templates, compiled into the binary so the server does not
/// depend on its working directory.
pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("admin/base.html", include_str!("../../templates/admin/base.html")),
        ("admin/login.html", include_str!("../../templates/admin/login.html")),
        ("admin/dashboard.html", include_str!("../../templates/admin/dashboard.html")),
        ("admin/preview.html", include_str!("../../templates/admin/preview.html")),
    ])?;
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_admin_templates_compile() {
        let tera = load_templates().unwrap();
        let names: Vec<&str> = tera.get_template_names().collect();
        assert!(names.contains(&"admin/dashboard.html"));
        assert!(names.contains(&"admin/login.html"));
    }
}
