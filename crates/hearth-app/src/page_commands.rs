//! Page list commands: pages, add-page, insert-page, remove-page, move-page, home.

use hearth_core::PageModel;
use hearth_core::error::{HearthError, Result};
use hearth_core::page::PageType;

use crate::commands::{Command, CommandOutput, CommandRegistry, parse_arg};

// ---------------------------------------------------------------------------
// pages
// ---------------------------------------------------------------------------

struct PagesCmd;
impl Command for PagesCmd {
    fn name(&self) -> &str {
        "pages"
    }
    fn description(&self) -> &str {
        "List pages with their widget-page and tab indices"
    }
    fn usage(&self) -> &str {
        "pages"
    }
    fn execute(&self, _args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let opt = |i: Option<usize>| i.map_or_else(|| "-".to_string(), |i| i.to_string());
        let home = model.home_tab();
        let rows = model
            .pages()
            .iter()
            .enumerate()
            .map(|(i, page)| {
                vec![
                    i.to_string(),
                    page.to_string(),
                    opt(model.widget_page_index_for(i)),
                    opt(model.apps_and_widgets_tab_index_for(i)),
                    if i == home { "*".to_string() } else { String::new() },
                ]
            })
            .collect();
        Ok(CommandOutput::Table {
            headers: ["page", "type", "widget page", "tab", "home"]
                .map(String::from)
                .to_vec(),
            rows,
        })
    }
}

// ---------------------------------------------------------------------------
// add-page / insert-page
// ---------------------------------------------------------------------------

struct AddPageCmd;
impl Command for AddPageCmd {
    fn name(&self) -> &str {
        "add-page"
    }
    fn description(&self) -> &str {
        "Append a page (apps or widgets)"
    }
    fn usage(&self) -> &str {
        "add-page <type>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let page_type: PageType = parse_arg(args, 0, self.usage())?;
        let index = model
            .add_page(page_type)
            .ok_or_else(|| HearthError::Command("pager is full".to_string()))?;
        Ok(CommandOutput::Text(format!("added {page_type} page at {index}")))
    }
}

struct InsertPageCmd;
impl Command for InsertPageCmd {
    fn name(&self) -> &str {
        "insert-page"
    }
    fn description(&self) -> &str {
        "Insert a page, shifting later pages right"
    }
    fn usage(&self) -> &str {
        "insert-page <index> <type>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let index: usize = parse_arg(args, 0, self.usage())?;
        let page_type: PageType = parse_arg(args, 1, self.usage())?;
        let index = model
            .insert_page(index, page_type)
            .ok_or_else(|| HearthError::Command("pager is full".to_string()))?;
        Ok(CommandOutput::Text(format!("inserted {page_type} page at {index}")))
    }
}

// ---------------------------------------------------------------------------
// remove-page / move-page
// ---------------------------------------------------------------------------

struct RemovePageCmd;
impl Command for RemovePageCmd {
    fn name(&self) -> &str {
        "remove-page"
    }
    fn description(&self) -> &str {
        "Remove a page and everything stored for it"
    }
    fn usage(&self) -> &str {
        "remove-page <index>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let index: usize = parse_arg(args, 0, self.usage())?;
        Ok(match model.remove_page(index) {
            Some(page_type) => CommandOutput::Text(format!("removed {page_type} page {index}")),
            None => CommandOutput::Text(format!("no page {index}")),
        })
    }
}

struct MovePageCmd;
impl Command for MovePageCmd {
    fn name(&self) -> &str {
        "move-page"
    }
    fn description(&self) -> &str {
        "Move a page to a new position"
    }
    fn usage(&self) -> &str {
        "move-page <from> <to>"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        let from: usize = parse_arg(args, 0, self.usage())?;
        let to: usize = parse_arg(args, 1, self.usage())?;
        if !model.move_page(from, to) {
            return Err(HearthError::Command(format!("cannot move page {from} to {to}")));
        }
        Ok(CommandOutput::Text(format!("moved page {from} to {to}")))
    }
}

// ---------------------------------------------------------------------------
// home
// ---------------------------------------------------------------------------

struct HomeCmd;
impl Command for HomeCmd {
    fn name(&self) -> &str {
        "home"
    }
    fn description(&self) -> &str {
        "Show or set the home page"
    }
    fn usage(&self) -> &str {
        "home [page]"
    }
    fn execute(&self, args: &[&str], model: &mut PageModel) -> Result<CommandOutput> {
        if args.is_empty() {
            return Ok(CommandOutput::Text(format!("home page: {}", model.home_tab())));
        }
        let index: usize = parse_arg(args, 0, self.usage())?;
        if !model.set_home_tab(index) {
            return Err(HearthError::Command(format!("no page {index}")));
        }
        Ok(CommandOutput::None)
    }
}

pub fn register_page_commands(reg: &mut CommandRegistry) {
    reg.register(Box::new(PagesCmd));
    reg.register(Box::new(AddPageCmd));
    reg.register(Box::new(InsertPageCmd));
    reg.register(Box::new(RemovePageCmd));
    reg.register(Box::new(MovePageCmd));
    reg.register(Box::new(HomeCmd));
}
