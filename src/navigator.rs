use std::fmt;

use thiserror::Error;

use crate::models::Client;

/// The screen currently presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Add,
    Details,
    Edit,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::List => "list",
            View::Add => "add",
            View::Details => "details",
            View::Edit => "edit",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NavigationError {
    #[error("cannot {action} from the {from} view")]
    InvalidTransition { from: View, action: &'static str },

    #[error("no delete is waiting for confirmation")]
    NothingToConfirm,
}

/// Which screen is active and which client it is about.
///
/// The selected client is a snapshot; callers refresh it from the
/// repository after a save.
#[derive(Debug)]
pub struct Navigator {
    view: View,
    selected: Option<Client>,
    pending_delete: Option<String>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            view: View::List,
            selected: None,
            pending_delete: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected(&self) -> Option<&Client> {
        self.selected.as_ref()
    }

    /// Identifier waiting for a yes/no answer, if any.
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    fn require(&self, allowed: &[View], action: &'static str) -> Result<(), NavigationError> {
        if self.pending_delete.is_some() || !allowed.contains(&self.view) {
            return Err(NavigationError::InvalidTransition {
                from: self.view,
                action,
            });
        }
        Ok(())
    }

    pub fn select(&mut self, client: Client) -> Result<(), NavigationError> {
        self.require(&[View::List], "select a client")?;
        self.selected = Some(client);
        self.view = View::Details;
        Ok(())
    }

    pub fn add_new(&mut self) -> Result<(), NavigationError> {
        self.require(&[View::List], "add a client")?;
        self.selected = None;
        self.view = View::Add;
        Ok(())
    }

    pub fn edit(&mut self) -> Result<(), NavigationError> {
        self.require(&[View::Details], "edit")?;
        self.view = View::Edit;
        Ok(())
    }

    pub fn back(&mut self) -> Result<(), NavigationError> {
        self.require(&[View::Details], "go back")?;
        self.view = View::List;
        Ok(())
    }

    /// Leave a form without saving.
    pub fn cancel(&mut self) -> Result<(), NavigationError> {
        self.require(&[View::Add, View::Edit], "cancel")?;
        self.view = match self.view {
            View::Edit => View::Details,
            _ => View::List,
        };
        Ok(())
    }

    /// The add form was saved.
    pub fn created(&mut self) -> Result<(), NavigationError> {
        self.require(&[View::Add], "save a new client")?;
        self.selected = None;
        self.view = View::List;
        Ok(())
    }

    /// The edit form was saved; `saved` is the repository's copy.
    pub fn updated(&mut self, saved: Client) -> Result<(), NavigationError> {
        self.require(&[View::Edit], "save changes")?;
        self.selected = Some(saved);
        self.view = View::Details;
        Ok(())
    }

    /// Ask for confirmation before deleting `id`.
    pub fn request_delete(&mut self, id: impl Into<String>) -> Result<(), NavigationError> {
        self.require(&[View::List, View::Details], "delete")?;
        self.pending_delete = Some(id.into());
        Ok(())
    }

    /// Accept the pending delete. Returns the identifier to remove.
    pub fn confirm_delete(&mut self) -> Result<String, NavigationError> {
        let id = self
            .pending_delete
            .take()
            .ok_or(NavigationError::NothingToConfirm)?;
        self.selected = None;
        self.view = View::List;
        Ok(id)
    }

    pub fn decline_delete(&mut self) -> Result<(), NavigationError> {
        self.pending_delete
            .take()
            .map(|_| ())
            .ok_or(NavigationError::NothingToConfirm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Measurements;

    fn ali() -> Client {
        Client::new("Ali Rezaei", Some("0912".into()), Measurements::default())
    }

    #[test]
    fn starts_on_the_list() {
        let nav = Navigator::new();
        assert_eq!(nav.view(), View::List);
        assert!(nav.selected().is_none());
    }

    #[test]
    fn select_edit_cancel_keeps_the_subject() {
        let mut nav = Navigator::new();
        let client = ali();

        nav.select(client.clone()).unwrap();
        assert_eq!(nav.view(), View::Details);
        assert_eq!(nav.selected(), Some(&client));

        nav.edit().unwrap();
        assert_eq!(nav.view(), View::Edit);
        assert_eq!(nav.selected(), Some(&client));

        nav.cancel().unwrap();
        assert_eq!(nav.view(), View::Details);
        assert_eq!(nav.selected(), Some(&client));
    }

    #[test]
    fn saving_an_edit_refreshes_the_subject() {
        let mut nav = Navigator::new();
        let client = ali();
        nav.select(client.clone()).unwrap();
        nav.edit().unwrap();

        let mut saved = client.clone();
        saved.name = "Ali R.".into();
        nav.updated(saved.clone()).unwrap();

        assert_eq!(nav.view(), View::Details);
        assert_eq!(nav.selected(), Some(&saved));
    }

    #[test]
    fn add_flow_clears_the_subject() {
        let mut nav = Navigator::new();
        nav.add_new().unwrap();
        assert_eq!(nav.view(), View::Add);
        assert!(nav.selected().is_none());

        nav.created().unwrap();
        assert_eq!(nav.view(), View::List);
        assert!(nav.selected().is_none());

        nav.add_new().unwrap();
        nav.cancel().unwrap();
        assert_eq!(nav.view(), View::List);
    }

    #[test]
    fn back_returns_to_the_list() {
        let mut nav = Navigator::new();
        nav.select(ali()).unwrap();
        nav.back().unwrap();
        assert_eq!(nav.view(), View::List);
    }

    #[test]
    fn confirmed_delete_from_details_lands_on_the_list() {
        let mut nav = Navigator::new();
        let client = ali();
        nav.select(client.clone()).unwrap();

        nav.request_delete(client.id.clone()).unwrap();
        assert_eq!(nav.pending_delete(), Some(client.id.as_str()));

        assert_eq!(nav.confirm_delete().unwrap(), client.id);
        assert_eq!(nav.view(), View::List);
        assert!(nav.selected().is_none());
        assert!(nav.pending_delete().is_none());
    }

    #[test]
    fn declined_delete_changes_nothing() {
        let mut nav = Navigator::new();
        let client = ali();
        nav.select(client.clone()).unwrap();

        nav.request_delete(client.id.clone()).unwrap();
        nav.decline_delete().unwrap();

        assert_eq!(nav.view(), View::Details);
        assert_eq!(nav.selected(), Some(&client));
        assert!(nav.pending_delete().is_none());
    }

    #[test]
    fn delete_from_the_list() {
        let mut nav = Navigator::new();
        nav.request_delete("abc").unwrap();
        assert_eq!(nav.confirm_delete().unwrap(), "abc");
        assert_eq!(nav.view(), View::List);
    }

    #[test]
    fn invalid_transitions_are_rejected_without_side_effects() {
        let mut nav = Navigator::new();

        assert_eq!(
            nav.edit(),
            Err(NavigationError::InvalidTransition {
                from: View::List,
                action: "edit"
            })
        );
        assert!(nav.back().is_err());
        assert!(nav.cancel().is_err());
        assert!(nav.updated(ali()).is_err());
        assert_eq!(nav.confirm_delete(), Err(NavigationError::NothingToConfirm));
        assert_eq!(nav.view(), View::List);

        nav.add_new().unwrap();
        assert!(nav.request_delete("x").is_err());
        assert!(nav.select(ali()).is_err());
        assert_eq!(nav.view(), View::Add);
    }

    #[test]
    fn pending_delete_blocks_other_moves() {
        let mut nav = Navigator::new();
        nav.select(ali()).unwrap();
        nav.request_delete("x").unwrap();

        assert!(nav.edit().is_err());
        assert!(nav.back().is_err());
        assert_eq!(nav.view(), View::Details);
    }
}
