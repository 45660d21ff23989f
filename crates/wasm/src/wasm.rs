//! DOM binding for the table controller.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement, Node, Storage, Window, console};

use crate::controller::{Frame, RowModel, TableViewController};
use crate::selection::{SelectionStore, SessionStorage};

const CHECKBOX: &str = r#"input[type="checkbox"][name="selectedItems"]"#;
const QUANTITY: &str = ".quantity-input";
const ROW_INDEX: &str = "data-row-index";

struct BrowserStorage(Option<Storage>);

impl SessionStorage for BrowserStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.0.as_ref()?.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        if let Some(storage) = &self.0
            && let Err(err) = storage.set_item(key, value)
        {
            console::warn_2(&"sheetview: failed to persist selection".into(), &err);
        }
    }

    fn remove_item(&mut self, key: &str) {
        if let Some(storage) = &self.0 {
            let _ = storage.remove_item(key);
        }
    }
}

struct RowHandles {
    row: HtmlElement,
    checkbox: Option<HtmlInputElement>,
    quantity: Option<HtmlInputElement>,
    total: Option<Element>,
}

impl RowHandles {
    fn model(&self) -> RowModel {
        let id = self.checkbox.as_ref().map(HtmlInputElement::value).unwrap_or_default();
        let search = self.row.get_attribute("data-search").unwrap_or_default();
        let mut model = RowModel::new(id, &search, self.row.get_attribute("data-unit-price").as_deref());
        model.quantity = self.quantity.as_ref().map(HtmlInputElement::value).unwrap_or_default();
        model
    }
}

struct Page {
    window: Window,
    controller: TableViewController<BrowserStorage>,
    rows: Vec<RowHandles>,
    selected_count: Option<Element>,
    count_toggle: Option<HtmlElement>,
    grand_total: Option<Element>,
    show_selected: Option<HtmlInputElement>,
    menu: Option<Element>,
    armed_deadline: Option<u64>,
}

type Shared = Rc<RefCell<Page>>;

fn now_ms() -> u64 {
    js_sys::Date::now() as u64
}

fn by_id<T: JsCast>(document: &Document, id: &str) -> Option<T> {
    document.get_element_by_id(id)?.dyn_into().ok()
}

fn query_in<T: JsCast>(parent: &Element, selector: &str) -> Option<T> {
    parent.query_selector(selector).ok()??.dyn_into().ok()
}

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into().ok()
}

fn row_index(target: &Element) -> Option<usize> {
    target.closest("tr").ok()??.get_attribute(ROW_INDEX)?.parse().ok()
}

fn collect_rows(body: &Element) -> Result<Vec<RowHandles>, JsValue> {
    let nodes = body.query_selector_all("tr")?;
    let mut rows = Vec::with_capacity(nodes.length() as usize);
    for i in 0..nodes.length() {
        let Some(row) = nodes.get(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) else { continue };
        row.set_attribute(ROW_INDEX, &rows.len().to_string())?;
        let checkbox = query_in(&row, CHECKBOX);
        let quantity = query_in(&row, QUANTITY);
        let total = query_in(&row, ".total-price-cell");
        rows.push(RowHandles { row, checkbox, quantity, total });
    }
    Ok(rows)
}

impl Page {
    fn apply(&self, frame: &Frame) {
        for patch in &frame.patches {
            let Some(handles) = self.rows.get(patch.index) else { continue };
            let view = &patch.view;
            let display = if view.visible { "table-row" } else { "none" };
            let _ = handles.row.style().set_property("display", display);
            let _ = handles.row.class_list().toggle_with_force("table-checked", view.checked);
            if let Some(checkbox) = &handles.checkbox {
                checkbox.set_checked(view.checked);
            }
            if let Some(quantity) = &handles.quantity
                && quantity.value() != view.quantity
            {
                quantity.set_value(&view.quantity);
            }
            if let Some(total) = &handles.total {
                total.set_text_content(Some(&view.total));
            }
        }

        if let Some(count) = &self.selected_count {
            count.set_text_content(Some(&format!("{} selected", frame.selected_count)));
        }
        if let Some(toggle) = &self.count_toggle {
            let _ = toggle.style().set_property("display", "inline-flex");
        }
        if let Some(total) = &self.grand_total {
            total.set_text_content(Some(&frame.grand_total));
        }
        if let Some(toggle) = &self.show_selected {
            toggle.set_checked(self.controller.show_selected());
        }
    }

    fn close_menu(&self) {
        if let Some(menu) = &self.menu {
            let _ = menu.class_list().remove_1("show");
        }
    }
}

/// Render, then make sure a timer wakes us at the next debounce deadline.
fn refresh(page: &Shared) {
    let frame = page.borrow_mut().controller.render();
    page.borrow().apply(&frame);
    arm_timer(page);
}

fn arm_timer(page: &Shared) {
    let (window, deadline) = {
        let p = page.borrow();
        match p.controller.next_deadline() {
            Some(deadline) if p.armed_deadline != Some(deadline) => (p.window.clone(), deadline),
            _ => return,
        }
    };
    page.borrow_mut().armed_deadline = Some(deadline);

    // Superseded timers fire harmlessly: `tick` only acts on due deadlines.
    let delay = deadline.saturating_sub(now_ms()).min(i32::MAX as u64) as i32;
    let shared = page.clone();
    let callback = Closure::once_into_js(move || {
        let changed = {
            let mut p = shared.borrow_mut();
            p.armed_deadline = None;
            p.controller.tick(now_ms())
        };
        if changed {
            refresh(&shared);
        } else {
            arm_timer(&shared);
        }
    });
    if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay) {
        console::warn_2(&"sheetview: failed to schedule timer".into(), &err);
    }
}

fn listen<F>(target: &web_sys::EventTarget, event: &str, handler: F) -> Result<(), JsValue>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

/// Entry point, run when the module is instantiated.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("sheetview: no window")?;
    let document = window.document().ok_or("sheetview: no document")?;

    if let Some(container) = document
        .query_selector(".table-responsive-container")?
        .and_then(|e| e.dyn_into::<HtmlElement>().ok())
    {
        let _ = container.focus();
    }

    let Some(body) = document.get_element_by_id("dataTableBody") else {
        console::warn_1(&"sheetview: #dataTableBody not found; table controller disabled".into());
        return Ok(());
    };

    let rows = collect_rows(&body)?;
    let models = rows.iter().map(RowHandles::model).collect();
    let search_input: Option<HtmlInputElement> = by_id(&document, "searchQuery");
    let initial_search = search_input.as_ref().map(HtmlInputElement::value).unwrap_or_default();

    let storage = BrowserStorage(window.session_storage().ok().flatten());
    let selection = SelectionStore::load(storage);
    if let Some(warning) = selection.load_warning() {
        console::warn_1(&format!("sheetview: {warning}").into());
    }

    let grand_total: Option<Element> = document.get_element_by_id("overallGrandTotal");
    if grand_total.is_none() {
        console::warn_1(&"sheetview: #overallGrandTotal not found; grand total disabled".into());
    }

    let page: Shared = Rc::new(RefCell::new(Page {
        window: window.clone(),
        controller: TableViewController::new(models, selection, &initial_search, now_ms()),
        rows,
        selected_count: document.get_element_by_id("selectedCount"),
        count_toggle: by_id(&document, "selectedCountDropdownToggle"),
        grand_total,
        show_selected: by_id(&document, "showSelectedToggle"),
        menu: document.get_element_by_id("selectedItemsDropdownMenu"),
        armed_deadline: None,
    }));

    let shared = page.clone();
    listen(&body, "change", move |event| {
        let Some(target) = event_element(&event) else { return };
        if !target.matches(CHECKBOX).unwrap_or(false) {
            return;
        }
        let (Some(index), Ok(checkbox)) = (row_index(&target), target.dyn_into::<HtmlInputElement>()) else {
            return;
        };
        shared.borrow_mut().controller.toggle_checkbox(index, checkbox.checked(), now_ms());
        refresh(&shared);
    })?;

    let shared = page.clone();
    listen(&body, "input", move |event| {
        let Some(target) = event_element(&event) else { return };
        if !target.matches(QUANTITY).unwrap_or(false) {
            return;
        }
        let (Some(index), Ok(input)) = (row_index(&target), target.dyn_into::<HtmlInputElement>()) else {
            return;
        };
        shared.borrow_mut().controller.set_quantity(index, &input.value(), now_ms());
        refresh(&shared);
    })?;

    let shared = page.clone();
    listen(&body, "click", move |event| {
        let Some(target) = event_element(&event) else { return };
        let excluded = target.closest(".product-link").ok().flatten().is_some()
            || target.closest(QUANTITY).ok().flatten().is_some()
            || target.matches(CHECKBOX).unwrap_or(false);
        if excluded {
            return;
        }
        let Some(index) = row_index(&target) else { return };
        shared.borrow_mut().controller.click_row(index, now_ms());
        refresh(&shared);
    })?;

    if let Some(input) = &search_input {
        let shared = page.clone();
        let source = input.clone();
        listen(input, "input", move |_| {
            shared.borrow_mut().controller.set_search_input(&source.value(), now_ms());
            arm_timer(&shared);
        })?;
    }

    if let Some(toggle) = by_id::<HtmlInputElement>(&document, "showSelectedToggle") {
        let shared = page.clone();
        let source = toggle.clone();
        listen(&toggle, "change", move |_| {
            shared.borrow_mut().controller.set_show_selected(source.checked());
            refresh(&shared);
        })?;
    }

    if let Some(button) = document.get_element_by_id("unselectAllBtn") {
        let shared = page.clone();
        listen(&button, "click", move |_| {
            shared.borrow_mut().controller.unselect_all(now_ms());
            shared.borrow().close_menu();
            refresh(&shared);
        })?;
    }

    let count_toggle: Option<Element> = document.get_element_by_id("selectedCountDropdownToggle");
    let menu = document.get_element_by_id("selectedItemsDropdownMenu");
    if let (Some(toggle), Some(menu)) = (count_toggle, menu) {
        let toggled = menu.clone();
        listen(&toggle, "click", move |event| {
            event.stop_propagation();
            let _ = toggled.class_list().toggle("show");
        })?;

        let shared = page.clone();
        listen(&document, "click", move |event| {
            let target = event.target();
            let target: Option<&Node> = target.as_ref().and_then(|t| t.dyn_ref());
            if !toggle.contains(target) && !menu.contains(target) {
                shared.borrow().close_menu();
            }
        })?;
    }

    let shared = page.clone();
    listen(&window, "pagehide", move |_| {
        shared.borrow_mut().controller.flush();
    })?;

    refresh(&page);
    Ok(())
}
