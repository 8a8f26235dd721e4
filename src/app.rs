//! Demo application state and key handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use formstate::{
    list_item, ControlType, FieldPath, FieldValue, Form, FormSeed, FormState, FormSubmitEvent,
    InputEvent, InputOptions, InputProps, ListValue, Reorder, Rule, RuleSet, SubmitEvent,
    ValueStore,
};
use std::cell::Cell;
use std::rc::Rc;

/// List field edited by the demo
pub const CONTACTS: &str = "contacts";

/// Focusable control on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Field {
        name: &'static str,
        label: &'static str,
        control: ControlType,
    },
    Item {
        index: usize,
        subfield: &'static str,
        label: &'static str,
    },
}

impl Control {
    pub fn label(&self) -> String {
        match self {
            Control::Field { label, .. } => label.to_string(),
            Control::Item { index, label, .. } => format!("Contact {} {}", index + 1, label),
        }
    }

    pub fn path(&self) -> FieldPath {
        match self {
            Control::Field { name, .. } => FieldPath::field(*name),
            Control::Item {
                index, subfield, ..
            } => FieldPath::item(CONTACTS, *index, *subfield),
        }
    }

    fn options(&self) -> InputOptions {
        match self {
            Control::Field {
                control: ControlType::Checkbox,
                ..
            } => InputOptions::checkbox(),
            _ => InputOptions::default(),
        }
    }
}

const SCALAR_CONTROLS: [Control; 3] = [
    Control::Field {
        name: "name",
        label: "Name",
        control: ControlType::Input,
    },
    Control::Field {
        name: "email",
        label: "Email",
        control: ControlType::Input,
    },
    Control::Field {
        name: "newsletter",
        label: "Newsletter",
        control: ControlType::Checkbox,
    },
];

const ITEM_SUBFIELDS: [(&str, &str); 2] = [("name", "Name"), ("email", "Email")];

fn required() -> Rule {
    Rule::scalar(|value: &FieldValue, _: &ValueStore| {
        (!value.is_truthy()).then_some("This field is required")
    })
}

fn email() -> Rule {
    Rule::scalar(|value: &FieldValue, _: &ValueStore| {
        let text = value.as_str().unwrap_or_default();
        (!text.contains('@')).then_some("Enter a valid email address")
    })
}

/// Validation rules of the demo contact form
pub fn contact_rules() -> RuleSet {
    RuleSet::new()
        .with("name", required())
        .with("email", email())
        .with(
            CONTACTS,
            Rule::list_of([("name", required()), ("email", email())]),
        )
}

/// Values used when no seed file exists
pub fn default_seed() -> FormSeed {
    FormSeed {
        initial_values: ValueStore::from_iter([
            ("name", FieldValue::from("")),
            ("email", FieldValue::from("")),
            ("newsletter", FieldValue::from(false)),
            (CONTACTS, FieldValue::List(ListValue::new(vec![empty_contact()]))),
        ]),
        ..Default::default()
    }
}

fn empty_contact() -> formstate::ListItem {
    list_item([("name", ""), ("email", "")])
}

/// Main application struct
pub struct App {
    pub form: Form,
    /// Index of the focused control
    pub focus: usize,
    /// Number of state replacements seen by the subscriber
    pub revisions: Rc<Cell<usize>>,
    pub status_message: Option<String>,
    /// JSON of the last successfully submitted values
    pub submitted: Option<String>,
    quit: bool,
}

impl App {
    pub fn new(seed: FormSeed) -> Self {
        let mut form = Form::new(seed.into_config(contact_rules()));
        let revisions = Rc::new(Cell::new(0));
        let counter = Rc::clone(&revisions);
        form.subscribe(move |_: &FormState| counter.set(counter.get() + 1));

        Self {
            form,
            focus: 0,
            revisions,
            status_message: None,
            submitted: None,
            quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Controls in display order; grows and shrinks with the contact list
    pub fn controls(&self) -> Vec<Control> {
        let contacts = self
            .form
            .values()
            .get_list(CONTACTS)
            .map(ListValue::len)
            .unwrap_or(0);
        let items = (0..contacts).flat_map(|index| {
            ITEM_SUBFIELDS
                .iter()
                .map(move |&(subfield, label)| Control::Item {
                    index,
                    subfield,
                    label,
                })
        });
        SCALAR_CONTROLS.iter().cloned().chain(items).collect()
    }

    /// Descriptor for a control, `None` for stale list addresses
    pub fn props(&self, control: &Control) -> Option<InputProps> {
        match control {
            Control::Field { name, .. } => {
                Some(self.form.get_input_props(name, control.options()))
            }
            Control::Item {
                index, subfield, ..
            } => self
                .form
                .get_list_input_props(CONTACTS, *index, subfield, control.options()),
        }
    }

    fn focused(&self) -> Option<Control> {
        self.controls().get(self.focus).cloned()
    }

    fn focused_contact(&self) -> Option<usize> {
        match self.focused() {
            Some(Control::Item { index, .. }) => Some(index),
            _ => None,
        }
    }

    fn move_focus(&mut self, forward: bool) {
        // Validate the control being left
        if let Some(control) = self.focused() {
            self.form.validate_field(&control.path());
        }
        let count = self.controls().len();
        if count == 0 {
            return;
        }
        self.focus = if forward {
            (self.focus + 1) % count
        } else if self.focus == 0 {
            count - 1
        } else {
            self.focus - 1
        };
    }

    fn clamp_focus(&mut self) {
        let count = self.controls().len();
        if self.focus >= count {
            self.focus = count.saturating_sub(1);
        }
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Tab => self.move_focus(true),
            KeyCode::BackTab => self.move_focus(false),
            KeyCode::Enter => self.submit()?,
            KeyCode::Char('s') if ctrl => self.submit()?,
            KeyCode::Char('r') if ctrl => {
                self.form.reset();
                self.clamp_focus();
                self.status_message = Some("Form reset".to_string());
            }
            KeyCode::Char('n') if ctrl => {
                self.form.add_list_item(CONTACTS, empty_contact());
            }
            KeyCode::Char('d') if ctrl => {
                if let Some(index) = self.focused_contact() {
                    self.form.remove_list_item(CONTACTS, index);
                    self.clamp_focus();
                }
            }
            KeyCode::Up if ctrl => self.move_contact(false),
            KeyCode::Down if ctrl => self.move_contact(true),
            KeyCode::Char(' ') if self.focused_is_checkbox() => self.toggle_focused(),
            KeyCode::Char(c) if !ctrl => self.edit_focused(|text| text.push(c)),
            KeyCode::Backspace => self.edit_focused(|text| {
                text.pop();
            }),
            _ => {}
        }
        Ok(())
    }

    fn focused_is_checkbox(&self) -> bool {
        matches!(
            self.focused(),
            Some(Control::Field {
                control: ControlType::Checkbox,
                ..
            })
        )
    }

    fn edit_focused(&mut self, edit: impl FnOnce(&mut String)) {
        let Some(props) = self.focused().and_then(|control| self.props(&control)) else {
            return;
        };
        let Some(value) = props.value() else {
            return;
        };
        let mut text = value.display_value();
        edit(&mut text);
        props.on_change.call(&mut self.form, InputEvent::text(text));
    }

    fn toggle_focused(&mut self) {
        let Some(props) = self.focused().and_then(|control| self.props(&control)) else {
            return;
        };
        let checked = props.checked().unwrap_or(false);
        props
            .on_change
            .call(&mut self.form, InputEvent::checkbox(!checked));
    }

    fn move_contact(&mut self, down: bool) {
        let Some(from) = self.focused_contact() else {
            return;
        };
        let Some(to) = (if down { from.checked_add(1) } else { from.checked_sub(1) }) else {
            return;
        };
        let outcome = self.form.reorder_list_item(CONTACTS, Reorder { from, to });
        if outcome.is_applied() {
            // Keep focus on the moved contact
            let width = ITEM_SUBFIELDS.len();
            let offset = (self.focus - SCALAR_CONTROLS.len()) % width;
            self.focus = SCALAR_CONTROLS.len() + to * width + offset;
        }
    }

    fn submit(&mut self) -> Result<()> {
        let mut submitted = None;
        let mut handler = self.form.on_submit(|values: &ValueStore, _: &mut dyn SubmitEvent| {
            submitted = Some(serde_json::to_string(values));
        });
        let mut event = FormSubmitEvent::default();
        let result = handler.handle(&mut self.form, &mut event);

        if let Some(json) = submitted {
            self.submitted = Some(json?);
            self.status_message = Some("Submitted".to_string());
            tracing::info!("form submitted");
        } else {
            self.status_message = Some(format!(
                "{} field(s) need attention",
                result.errors.len()
            ));
        }
        Ok(())
    }
}
