//! Keeps `aria-hidden` and the tab order in step with visibility.
//!
//! Hiding forces `tabindex="-1"` on the element and its focusable
//! descendants, remembering any author tabindex. Showing undoes what hiding
//! forced. When the element was marked `aria-hidden`, an authored `-1` is
//! cleared as well.

use crate::attrs;
use crate::host::AnimationHost;
use crate::ids::ElementId;
use crate::state::ElementTable;

pub fn set_hidden(host: &mut dyn AnimationHost, table: &mut ElementTable, el: ElementId, hidden: bool) {
    let mut targets = vec![el];
    targets.extend(host.focusable_descendants(el));

    if hidden {
        host.set_attribute(el, attrs::ARIA_HIDDEN, "true");
        for t in targets {
            force_out_of_tab_order(host, table, t);
        }
    } else {
        let was_hidden = host
            .attribute(el, attrs::ARIA_HIDDEN)
            .is_some_and(|v| v.trim() == "true");
        host.remove_attribute(el, attrs::ARIA_HIDDEN);
        for t in targets {
            restore_tab_order(host, table, t, was_hidden);
        }
    }
}

fn force_out_of_tab_order(host: &mut dyn AnimationHost, table: &mut ElementTable, el: ElementId) {
    let st = table.entry(el);
    if !st.tabindex_forced {
        st.saved_tabindex = host.attribute(el, attrs::TABINDEX);
        st.tabindex_forced = true;
    }
    host.set_attribute(el, attrs::TABINDEX, "-1");
}

fn is_negative(tabindex: &str) -> bool {
    tabindex.trim() == "-1"
}

fn restore_tab_order(
    host: &mut dyn AnimationHost,
    table: &mut ElementTable,
    el: ElementId,
    clear_negative: bool,
) {
    let forced = table.get_mut(el).filter(|st| st.tabindex_forced);
    let Some(st) = forced else {
        if clear_negative && host.attribute(el, attrs::TABINDEX).is_some_and(|t| is_negative(&t)) {
            host.remove_attribute(el, attrs::TABINDEX);
        }
        return;
    };
    st.tabindex_forced = false;
    match st.saved_tabindex.take() {
        Some(prev) if !(clear_negative && is_negative(&prev)) => {
            host.set_attribute(el, attrs::TABINDEX, &prev)
        }
        _ => host.remove_attribute(el, attrs::TABINDEX),
    }
}
