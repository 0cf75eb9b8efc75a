//! ---
//! su_section: "05-networking-external-interfaces"
//! su_subsection: "binary"
//! su_type: "source"
//! su_scope: "code"
//! su_description: "Terminal console for the student union management system."
//! su_version: "v0.1.0"
//! su_owner: "tbd"
//! ---
use anyhow::Result;
use indexmap::IndexMap;
use serde_json::json;
use su_api::{ListQuery, Page};
use su_security::{effective_permissions, Menu, RouteSpec, View};

use crate::context::AppContext;

type Row = IndexMap<&'static str, String>;

fn flag(value: bool) -> String {
    let text = if value { "yes" } else { "no" };
    text.to_owned()
}

fn optional<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}

/// Render rows as an aligned text table; column order follows the first row.
fn table(rows: &[Row]) -> String {
    let Some(first) = rows.first() else {
        return "(no records)\n".to_owned();
    };
    let columns: Vec<&str> = first.keys().copied().collect();
    let widths: Vec<usize> = columns
        .iter()
        .map(|column| {
            rows.iter()
                .filter_map(|row| row.get(column))
                .map(|cell| cell.chars().count())
                .chain([column.chars().count()])
                .max()
                .unwrap_or_default()
        })
        .collect();

    let mut out = String::new();
    let line = |cells: Vec<&str>, out: &mut String| {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(padded.join("  ").trim_end());
        out.push('\n');
    };
    line(columns.clone(), &mut out);
    for row in rows {
        line(
            columns
                .iter()
                .map(|column| row.get(column).map(String::as_str).unwrap_or(""))
                .collect(),
            &mut out,
        );
    }
    out
}

fn print_page<T>(title: &str, page: &Page<T>, to_row: impl Fn(&T) -> Row) {
    println!("{title}");
    let rows: Vec<Row> = page.items.iter().map(to_row).collect();
    print!("{}", table(&rows));
    match (page.page, page.pages) {
        (Some(current), Some(pages)) => {
            println!("page {current} of {pages}, {} records", page.total)
        }
        _ => println!("{} records", page.total),
    }
}

pub async fn render(ctx: &AppContext, route: &RouteSpec, query: &ListQuery) -> Result<()> {
    let client = &ctx.client;
    match route.view {
        View::Students => {
            let page = client.students().list(query).await?;
            print_page(route.title, &page, |s| {
                let group = match &s.group {
                    Some(group) => group.name.clone(),
                    None => s.group_id.to_string(),
                };
                Row::from([
                    ("id", s.id.to_string()),
                    ("full_name", s.full_name.clone()),
                    ("group", group),
                    ("year", s.year.to_string()),
                    ("active", flag(s.is_active)),
                    ("budget", flag(s.is_budget)),
                ])
            });
        }
        View::Groups => {
            let page = client.groups().list(query).await?;
            print_page(route.title, &page, |g| {
                let subdivision = match &g.subdivision {
                    Some(subdivision) => subdivision.name.clone(),
                    None => g.subdivision_id.to_string(),
                };
                Row::from([
                    ("id", g.id.to_string()),
                    ("name", g.name.clone()),
                    ("year", g.year.to_string()),
                    ("subdivision", subdivision),
                ])
            });
        }
        View::Subdivisions => {
            let page = client.subdivisions().list(query).await?;
            print_page(route.title, &page, |s| {
                Row::from([("id", s.id.to_string()), ("name", s.name.clone())])
            });
        }
        View::Hostels => {
            let page = client.hostels().list(query).await?;
            print_page(route.title, &page, |h| {
                Row::from([
                    ("id", h.id.to_string()),
                    ("student_id", h.student_id.to_string()),
                    ("hostel", h.hostel.to_string()),
                    ("room", h.room.to_string()),
                    ("comment", optional(&h.comment)),
                ])
            });
        }
        View::Contributions => {
            let page = client.contributions().list(query).await?;
            print_page(route.title, &page, |c| {
                Row::from([
                    ("id", c.id.to_string()),
                    ("student_id", c.student_id.to_string()),
                    ("year", c.year.to_string()),
                    ("semester", c.semester.to_string()),
                    ("amount", format!("{:.2}", c.amount)),
                    ("paid_on", optional(&c.payment_date)),
                ])
            });
        }
        View::Users => {
            let page = client.users().list(query).await?;
            print_page(route.title, &page, |u| {
                let roles: Vec<&str> = u.roles.iter().map(|r| r.display_name()).collect();
                Row::from([
                    ("id", u.id.to_string()),
                    ("username", u.username.clone()),
                    ("roles", roles.join(", ")),
                    ("subdivision_id", optional(&u.subdivision_id)),
                ])
            });
        }
        View::Roles => {
            let page = client.roles().list(query).await?;
            print_page(route.title, &page, |r| {
                Row::from([
                    ("id", r.id.to_string()),
                    ("name", r.name.clone()),
                    ("title", su_security::Role::display_name_for(&r.name).to_owned()),
                ])
            });
        }
        View::AuditLogs => {
            let page = client.audit_logs().list(query).await?;
            print_page(route.title, &page, |entry| {
                Row::from([
                    ("id", entry.id.to_string()),
                    ("at", optional(&entry.created_at)),
                    ("user", entry.user_login.clone().unwrap_or_default()),
                    ("action", entry.action.clone()),
                    ("table", entry.table_name.clone()),
                    ("record_id", optional(&entry.record_id)),
                ])
            });
        }
        View::Profile => whoami(ctx, false)?,
        View::Login => println!("Sign in with `suctl login -u <user>`"),
        View::AccessDenied => println!("Access denied"),
        View::Home => println!("{}", route.title),
    }
    Ok(())
}

pub fn whoami(ctx: &AppContext, as_json: bool) -> Result<()> {
    let Some(identity) = ctx.session.identity() else {
        println!("Not signed in");
        return Ok(());
    };
    let permissions: Vec<String> = effective_permissions(&identity)
        .into_iter()
        .map(|p| p.to_string())
        .collect();
    if as_json {
        let roles: Vec<&str> = identity.role_names().collect();
        let body = json!({
            "username": &identity.username,
            "roles": roles,
            "permissions": permissions,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }
    let roles: Vec<&str> = identity.roles.iter().map(|r| r.display_name()).collect();
    println!("User:        {}", identity.username);
    println!("Roles:       {}", roles.join(", "));
    println!("Permissions: {}", permissions.join(", "));
    Ok(())
}

pub fn print_menu(menu: &Menu) {
    if menu.is_empty() {
        println!("Not signed in");
        return;
    }
    for entry in &menu.main {
        println!("{:<16} {}", entry.path, entry.title);
    }
    if !menu.admin.is_empty() {
        println!("-- admin --");
        for entry in &menu.admin {
            println!("{:<16} {}", entry.path, entry.title);
        }
    }
}
