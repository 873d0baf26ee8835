//! Per-page commands: icon positions, folders, visibility, layouts, widget
//! apps, and focus navigation.

use uuid::Uuid;

use hearth_core::PageModel;
use hearth_core::app::AppPosition;
use hearth_core::error::{HearthError, Result};
use hearth_core::input::Direction;

use crate::commands::{Command, CommandOutput, CommandRegistry, arg, parse_arg, parse_switch};

/// Resolve an id given in full or as a unique prefix.
fn parse_id<I>(raw: &str, ids: I) -> Result<Uuid>
where
    I: IntoIterator<Item = Uuid>,
{
    let raw = raw.to_ascii_lowercase();
    let mut matches = ids
        .into_iter()
        .filter(|id| id.to_string().starts_with(&raw));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id),
        (None, _) => Err(HearthError::Command(format!("no id starting with {raw}"))),
        (Some(_), Some(_)) => Err(HearthError::Command(format!("id prefix {raw} is ambiguous"))),
    }
}

fn short(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

// ---------------------------------------------------------------------------
// place / positions / freeform / snap
// ---------------------------------------------------------------------------

struct PlaceCmd;
impl Command for PlaceCmd {
    fn name(&self) -> &str {
        "place"
    }
    fn description(&self) -> &str {
        "Place an icon at a free-form position"
    }
    fn usage(&self) -> &str {
        "place <page> <package> <x> <y> [size]"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let package = arg(args, 1, self.usage())?;
        let x: f32 = parse_arg(args, 2, self.usage())?;
        let y: f32 = parse_arg(args, 3, self.usage())?;
        if args.len() > 4 {
            let size: f32 = parse_arg(args, 4, self.usage())?;
            model
                .positions_mut()
                .set_position(page, AppPosition::new(package, x, y).with_icon_size(size));
        } else {
            model.positions_mut().place(page, package, x, y);
        }
        Ok(CommandOutput::None)
    }
}

struct PositionsCmd;
impl Command for PositionsCmd {
    fn name(&self) -> &str {
        "positions"
    }
    fn description(&self) -> &str {
        "List icon positions on a page"
    }
    fn usage(&self) -> &str {
        "positions <page>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let rows = model
            .positions()
            .positions(page)
            .into_iter()
            .map(|p| {
                vec![
                    p.package_name,
                    p.x.to_string(),
                    p.y.to_string(),
                    p.icon_size.to_string(),
                ]
            })
            .collect();
        Ok(CommandOutput::Table {
            headers: ["package", "x", "y", "size"].map(String::from).to_vec(),
            rows,
        })
    }
}

struct FreeformCmd;
impl Command for FreeformCmd {
    fn name(&self) -> &str {
        "freeform"
    }
    fn description(&self) -> &str {
        "Show or toggle free-form mode for a page"
    }
    fn usage(&self) -> &str {
        "freeform <page> [on|off]"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        if let Some(raw) = args.get(1) {
            model.positions_mut().set_freeform(page, parse_switch(raw)?);
        }
        let state = if model.positions().is_freeform(page) {
            "on"
        } else {
            "off"
        };
        Ok(CommandOutput::Text(format!("page {page} free-form: {state}")))
    }
}

struct SnapCmd;
impl Command for SnapCmd {
    fn name(&self) -> &str {
        "snap"
    }
    fn description(&self) -> &str {
        "Round icon and folder positions to a grid"
    }
    fn usage(&self) -> &str {
        "snap <page> <cell>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let cell: f32 = parse_arg(args, 1, self.usage())?;
        model.positions_mut().snap_to_grid(page, cell);
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// folder / folders
// ---------------------------------------------------------------------------

struct FolderCmd;
impl Command for FolderCmd {
    fn name(&self) -> &str {
        "folder"
    }
    fn description(&self) -> &str {
        "Group apps into a new folder"
    }
    fn usage(&self) -> &str {
        "folder <page> <name> <x> <y> <package>..."
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let name = arg(args, 1, self.usage())?;
        let x: f32 = parse_arg(args, 2, self.usage())?;
        let y: f32 = parse_arg(args, 3, self.usage())?;
        let apps = args.get(4..).unwrap_or_default();
        let id = model
            .positions_mut()
            .create_folder(page, name, apps.iter().copied(), x, y)
            .ok_or_else(|| HearthError::Command(format!("usage: {}", self.usage())))?;
        Ok(CommandOutput::Text(format!("created folder {}", short(id))))
    }
}

struct FoldersCmd;
impl Command for FoldersCmd {
    fn name(&self) -> &str {
        "folders"
    }
    fn description(&self) -> &str {
        "List folders on a page"
    }
    fn usage(&self) -> &str {
        "folders <page>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let rows = model
            .positions()
            .folders(page)
            .into_iter()
            .map(|f| vec![short(f.id), f.name, f.apps.join(",")])
            .collect();
        Ok(CommandOutput::Table {
            headers: ["id", "name", "apps"].map(String::from).to_vec(),
            rows,
        })
    }
}

// ---------------------------------------------------------------------------
// hide / show / hidden
// ---------------------------------------------------------------------------

struct HideCmd;
impl Command for HideCmd {
    fn name(&self) -> &str {
        "hide"
    }
    fn description(&self) -> &str {
        "Hide an app on a page"
    }
    fn usage(&self) -> &str {
        "hide <page> <package>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        model
            .visibility_mut()
            .hide_app(page, arg(args, 1, self.usage())?);
        Ok(CommandOutput::None)
    }
}

struct ShowCmd;
impl Command for ShowCmd {
    fn name(&self) -> &str {
        "show"
    }
    fn description(&self) -> &str {
        "Unhide an app on a page"
    }
    fn usage(&self) -> &str {
        "show <page> <package>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        model
            .visibility_mut()
            .show_app(page, arg(args, 1, self.usage())?);
        Ok(CommandOutput::None)
    }
}

struct HiddenCmd;
impl Command for HiddenCmd {
    fn name(&self) -> &str {
        "hidden"
    }
    fn description(&self) -> &str {
        "List hidden apps on a page"
    }
    fn usage(&self) -> &str {
        "hidden <page>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let hidden: Vec<String> = model.visibility().hidden_apps(page).into_iter().collect();
        Ok(CommandOutput::Text(hidden.join("\n")))
    }
}

// ---------------------------------------------------------------------------
// save-layout / layouts / apply-layout / delete-layout
// ---------------------------------------------------------------------------

struct SaveLayoutCmd;
impl Command for SaveLayoutCmd {
    fn name(&self) -> &str {
        "save-layout"
    }
    fn description(&self) -> &str {
        "Save the page's current positions as a named layout"
    }
    fn usage(&self) -> &str {
        "save-layout <page> <name>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let name = arg(args, 1, self.usage())?;
        let id = model
            .save_current_layout(page, name)
            .ok_or_else(|| HearthError::Command(format!("page {page} has no room for more layouts")))?;
        Ok(CommandOutput::Text(format!("saved layout {}", short(id))))
    }
}

struct LayoutsCmd;
impl Command for LayoutsCmd {
    fn name(&self) -> &str {
        "layouts"
    }
    fn description(&self) -> &str {
        "List saved layouts on a page"
    }
    fn usage(&self) -> &str {
        "layouts <page>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let active = model.layouts().active_layout_id(page);
        let rows = model
            .layouts()
            .layouts(page)
            .into_iter()
            .map(|l| {
                vec![
                    short(l.id),
                    l.name,
                    l.positions.len().to_string(),
                    if Some(l.id) == active { "*".to_string() } else { String::new() },
                ]
            })
            .collect();
        Ok(CommandOutput::Table {
            headers: ["id", "name", "icons", "active"].map(String::from).to_vec(),
            rows,
        })
    }
}

struct ApplyLayoutCmd;
impl Command for ApplyLayoutCmd {
    fn name(&self) -> &str {
        "apply-layout"
    }
    fn description(&self) -> &str {
        "Restore a saved layout and mark it active"
    }
    fn usage(&self) -> &str {
        "apply-layout <page> <id>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let ids = model.layouts().layouts(page).into_iter().map(|l| l.id);
        let id = parse_id(arg(args, 1, self.usage())?, ids)?;
        model.apply_layout(page, id);
        Ok(CommandOutput::None)
    }
}

struct DeleteLayoutCmd;
impl Command for DeleteLayoutCmd {
    fn name(&self) -> &str {
        "delete-layout"
    }
    fn description(&self) -> &str {
        "Delete a saved layout"
    }
    fn usage(&self) -> &str {
        "delete-layout <page> <id>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let ids = model.layouts().layouts(page).into_iter().map(|l| l.id);
        let id = parse_id(arg(args, 1, self.usage())?, ids)?;
        model.layouts_mut().delete_layout(page, id);
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// widget-apps
// ---------------------------------------------------------------------------

struct WidgetAppsCmd;
impl Command for WidgetAppsCmd {
    fn name(&self) -> &str {
        "widget-apps"
    }
    fn description(&self) -> &str {
        "List or edit the apps shown on a page's widget area"
    }
    fn usage(&self) -> &str {
        "widget-apps <page> [show|hide|toggle <package> | first on|off]"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let widget_page = model
            .widget_page_index_for(page)
            .ok_or_else(|| HearthError::Command(format!("page {page} has no widget area")))?;
        if let Some(action) = args.get(1) {
            let value = arg(args, 2, self.usage())?;
            let apps = model.widget_apps_mut();
            match *action {
                "show" => apps.show_app(widget_page, value),
                "hide" => apps.hide_app(widget_page, value),
                "toggle" => {
                    apps.toggle_app(widget_page, value);
                },
                "first" => apps.set_apps_first(widget_page, parse_switch(value)?),
                other => return Err(HearthError::Command(format!("unknown action: {other}"))),
            }
        }
        let apps = model.widget_apps();
        let visible: Vec<String> = apps.visible_apps(widget_page).into_iter().collect();
        let order = if apps.apps_first(widget_page) {
            "apps first"
        } else {
            "widgets first"
        };
        Ok(CommandOutput::Text(format!(
            "widget page {widget_page} ({order}): {}",
            visible.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// nav
// ---------------------------------------------------------------------------

struct NavCmd;
impl Command for NavCmd {
    fn name(&self) -> &str {
        "nav"
    }
    fn description(&self) -> &str {
        "Find the icon reached by moving focus in a direction"
    }
    fn usage(&self) -> &str {
        "nav <page> <package> <direction>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page: usize = parse_arg(args, 0, self.usage())?;
        let package = arg(args, 1, self.usage())?;
        let direction: Direction = parse_arg(args, 2, self.usage())?;
        Ok(match model.navigate_focus(page, package, direction) {
            Some(target) => CommandOutput::Text(target),
            None => CommandOutput::Text(format!("nothing {direction} of {package}")),
        })
    }
}

pub fn register_icon_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(PlaceCmd));
    reg.register(Box::new(PositionsCmd));
    reg.register(Box::new(FreeformCmd));
    reg.register(Box::new(SnapCmd));
    reg.register(Box::new(FolderCmd));
    reg.register(Box::new(FoldersCmd));
    reg.register(Box::new(HideCmd));
    reg.register(Box::new(ShowCmd));
    reg.register(Box::new(HiddenCmd));
    reg.register(Box::new(SaveLayoutCmd));
    reg.register(Box::new(LayoutsCmd));
    reg.register(Box::new(ApplyLayoutCmd));
    reg.register(Box::new(DeleteLayoutCmd));
    reg.register(Box::new(WidgetAppsCmd));
    reg.register(Box::new(NavCmd));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::*;

    #[test]
    fn place_and_list() {
        let mut m = model();
        run(&mut m, "place 0 org.mail 10 20").unwrap();
        run(&mut m, "place 0 org.maps 1.5 2 48").unwrap();
        assert_eq!(
            text(&mut m, "positions 0"),
            "package | x | y | size\norg.mail | 10 | 20 | 64\norg.maps | 1.5 | 2 | 48"
        );
        assert!(run(&mut m, "place 0 org.mail ten 20").is_err());
    }

    #[test]
    fn freeform_and_snap() {
        let mut m = model();
        assert_eq!(text(&mut m, "freeform 0"), "page 0 free-form: off");
        assert_eq!(text(&mut m, "freeform 0 on"), "page 0 free-form: on");
        run(&mut m, "place 0 a 13 29").unwrap();
        run(&mut m, "snap 0 10").unwrap();
        assert_eq!(
            m.positions().position(0, "a").map(|p| (p.x, p.y)),
            Some((10.0, 30.0))
        );
    }

    #[test]
    fn folders() {
        let mut m = model();
        run(&mut m, "place 0 a 0 0").unwrap();
        let out = text(&mut m, r#"folder 0 "My Tools" 5 5 a b"#);
        assert!(out.starts_with("created folder "));
        assert!(m.positions().position(0, "a").is_none());
        let listing = text(&mut m, "folders 0");
        assert!(listing.contains("| My Tools | a,b"));
        assert!(run(&mut m, "folder 0 Empty 0 0").is_err());
    }

    #[test]
    fn hide_show() {
        let mut m = model();
        run(&mut m, "hide 0 b").unwrap();
        run(&mut m, "hide 0 a").unwrap();
        assert_eq!(text(&mut m, "hidden 0"), "a\nb");
        run(&mut m, "show 0 a").unwrap();
        assert_eq!(text(&mut m, "hidden 0"), "b");
    }

    #[test]
    fn layouts_by_prefix() {
        let mut m = model();
        run(&mut m, "place 0 a 1 1").unwrap();
        run(&mut m, "save-layout 0 Work").unwrap();
        let id = m.layouts().layouts(0)[0].id;
        run(&mut m, "place 0 a 9 9").unwrap();
        let prefix = &id.to_string()[..6];
        run(&mut m, &format!("apply-layout 0 {prefix}")).unwrap();
        assert_eq!(m.positions().position(0, "a").map(|p| p.x), Some(1.0));
        assert!(text(&mut m, "layouts 0").ends_with("| Work | 1 | *"));
        run(&mut m, &format!("delete-layout 0 {id}")).unwrap();
        assert_eq!(m.layouts().layout_count(0), 0);
        assert!(run(&mut m, "apply-layout 0 ffff").is_err());
    }

    #[test]
    fn layout_capacity_reported() {
        let mut m = model();
        for i in 0..hearth_core::config::MAX_LAYOUTS_PER_PAGE {
            run(&mut m, &format!("save-layout 1 L{i}")).unwrap();
        }
        let err = run(&mut m, "save-layout 1 extra").unwrap_err();
        assert!(err.to_string().contains("no room"));
    }

    #[test]
    fn widget_apps_by_page_position() {
        let mut m = model();
        run(&mut m, "add-page widgets").unwrap();
        run(&mut m, "widget-apps 1 show org.clock").unwrap();
        run(&mut m, "widget-apps 1 first on").unwrap();
        assert_eq!(
            text(&mut m, "widget-apps 1"),
            "widget page 1 (apps first): org.clock"
        );
        run(&mut m, "widget-apps 1 toggle org.clock").unwrap();
        assert!(m.widget_apps().visible_apps(1).is_empty());
        assert!(run(&mut m, "widget-apps 5").is_err());
        assert!(run(&mut m, "widget-apps 1 shout x").is_err());
    }

    #[test]
    fn nav_column() {
        let mut m = model();
        run(&mut m, "place 0 A 0 0").unwrap();
        run(&mut m, "place 0 B 0 50").unwrap();
        run(&mut m, "place 0 C 0 100").unwrap();
        assert_eq!(text(&mut m, "nav 0 A down"), "B");
        assert_eq!(text(&mut m, "nav 0 C up"), "B");
        assert_eq!(text(&mut m, "nav 0 B left"), "nothing left of B");
        assert!(run(&mut m, "nav 0 A sideways").is_err());
    }

    #[test]
    fn id_prefix_resolution() {
        let a = Uuid::parse_str("aaaaaaaa-0000-4000-8000-000000000000").unwrap();
        let b = Uuid::parse_str("aaaabbbb-0000-4000-8000-000000000000").unwrap();
        assert_eq!(parse_id("AAAAB", [a, b]).unwrap(), b);
        assert!(parse_id("aaaa", [a, b]).is_err());
        assert!(parse_id("c", [a, b]).is_err());
    }
}
