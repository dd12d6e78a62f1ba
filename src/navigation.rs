//! The navigation bar shown on every page of a financial control.

use maud::{Markup, html};

use crate::endpoints::{self, control_endpoint};

/// A link in the navigation bar.
///
/// `route` is the unformatted endpoint, used to decide whether the link is
/// the current page.
#[derive(Clone)]
struct Link {
    route: &'static str,
    url: String,
    title: &'static str,
    is_current: bool,
}

impl Link {
    fn into_desktop_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm lg:bg-transparent
        lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0
        dark:text-white lg:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white lg:dark:hover:bg-transparent"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        )
    }
}

/// The links shown for one financial control.
pub struct NavBar {
    links: Vec<Link>,
}

fn account_links(active_endpoint: &str) -> [Link; 2] {
    [
        Link {
            route: endpoints::CONTROLS_VIEW,
            url: endpoints::CONTROLS_VIEW.to_owned(),
            title: "Controls",
            is_current: active_endpoint == endpoints::CONTROLS_VIEW,
        },
        Link {
            route: endpoints::LOG_OUT,
            url: endpoints::LOG_OUT.to_owned(),
            title: "Log out",
            is_current: false,
        },
    ]
}

/// Routes shown in the bottom bar on small screens, the rest go under "More".
const MOBILE_PRIMARY_ROUTES: [&str; 3] = [
    endpoints::MONTH_VIEW,
    endpoints::ACCOUNTS_VIEW,
    endpoints::CARDS_VIEW,
];

impl NavBar {
    /// Get the navigation bar for the financial control `control_id`.
    ///
    /// If a link's route matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    pub fn new(active_endpoint: &str, control_id: i64) -> NavBar {
        let routes = [
            (endpoints::MONTH_VIEW, endpoints::CONTROL_VIEW, "Month"),
            (endpoints::ACCOUNTS_VIEW, endpoints::ACCOUNTS_VIEW, "Accounts"),
            (endpoints::CARDS_VIEW, endpoints::CARDS_VIEW, "Cards"),
            (endpoints::PROVISIONED_VIEW, endpoints::PROVISIONED_VIEW, "Provisioned"),
            (endpoints::TRANSFERS_VIEW, endpoints::TRANSFERS_VIEW, "Transfers"),
            (endpoints::BOXES_VIEW, endpoints::BOXES_VIEW, "Boxes"),
            (endpoints::CATEGORIES_VIEW, endpoints::CATEGORIES_VIEW, "Categories"),
            (endpoints::MEMBERS_VIEW, endpoints::MEMBERS_VIEW, "Members"),
        ];

        let mut links: Vec<Link> = routes
            .into_iter()
            .map(|(route, url, title)| Link {
                route,
                url: control_endpoint(url, control_id),
                title,
                is_current: active_endpoint == route,
            })
            .collect();

        links.extend(account_links(active_endpoint));

        NavBar { links }
    }

    /// The navigation bar for pages that are not about a single control,
    /// such as the list of controls.
    pub fn without_control(active_endpoint: &str) -> NavBar {
        NavBar {
            links: account_links(active_endpoint).into(),
        }
    }

    pub fn into_html(self) -> Markup {
        let links = self.links;
        let (primary, more): (Vec<Link>, Vec<Link>) = links
            .iter()
            .cloned()
            .partition(|link| MOBILE_PRIMARY_ROUTES.contains(&link.route));
        let more_is_active = more.iter().any(|link| link.is_current);

        let bottom_link_class = |is_current: bool| -> &'static str {
            if is_current {
                "flex w-full min-w-0 items-center justify-center rounded-lg \
                bg-blue-50 px-2.5 py-2 text-xs font-semibold leading-tight \
                text-blue-700 shadow-sm sm:px-4 sm:text-sm \
                dark:bg-blue-900/30 dark:text-blue-200"
            } else {
                "flex w-full min-w-0 items-center justify-center rounded-lg \
                px-2.5 py-2 text-xs font-semibold leading-tight text-gray-600 \
                sm:px-4 sm:text-sm \
                hover:bg-blue-50/70 hover:text-blue-700 dark:text-gray-300 \
                dark:hover:bg-blue-900/20 dark:hover:text-blue-200"
            }
        };
        let more_item_class = |is_current: bool| -> &'static str {
            if is_current {
                "block rounded-lg bg-blue-50 px-3 py-2 text-blue-700 \
                dark:bg-blue-900/30 dark:text-blue-200"
            } else {
                "block rounded-lg px-3 py-2 text-gray-700 hover:bg-gray-100 \
                hover:text-blue-700 dark:text-gray-200 dark:hover:bg-gray-800/80 \
                dark:hover:text-blue-200"
            }
        };

        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4"
                {
                    a href=(endpoints::CONTROLS_VIEW) class="flex items-center"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Financial Control"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto"
                    {
                        ul
                            class="font-medium flex flex-col p-4 lg:p-0 mt-4
                            border border-gray-100 rounded bg-gray-50
                            lg:flex-row lg:space-x-8 lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800
                            lg:dark:bg-gray-900 dark:border-gray-700"
                        {
                            @for link in links {
                                li { (link.into_desktop_html()) }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden"
            {
                div class="mx-auto max-w-screen-xl px-4 pb-4"
                {
                    ul
                        class="grid grid-cols-4 gap-2 px-4 py-3 rounded-xl border
                        border-gray-200 bg-white/95 shadow-lg dark:border-gray-700
                        dark:bg-gray-900/95"
                        aria-label="Primary"
                    {
                        @for link in &primary {
                            li class="min-w-0" {
                                a
                                    href=(link.url)
                                    class=(bottom_link_class(link.is_current))
                                    aria-current=[link.is_current.then_some("page")]
                                {
                                    span class="truncate" { (link.title) }
                                }
                            }
                        }

                        li class="min-w-0" {
                            details class="group relative"
                            {
                                summary
                                    class=(bottom_link_class(more_is_active))
                                    aria-current=[more_is_active.then_some("page")]
                                {
                                    span class="truncate" { "More" }
                                }

                                ul
                                    class="absolute bottom-full right-0 mb-3 w-40 rounded-xl
                                    border border-gray-200 bg-white/95 p-2 shadow-xl
                                    flex flex-col gap-1 text-sm font-medium
                                    dark:border-gray-700 dark:bg-gray-900/95"
                                {
                                    @for link in &more {
                                        li {
                                            a
                                                href=(link.url)
                                                class=(more_item_class(link.is_current))
                                            {
                                                (link.title)
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}

#[cfg(test)]
mod nav_bar_tests {
    use crate::{endpoints, navigation::NavBar};

    #[test]
    fn set_active_endpoint() {
        let cases = [
            (endpoints::MONTH_VIEW, true),
            (endpoints::ACCOUNTS_VIEW, true),
            (endpoints::CARDS_VIEW, true),
            (endpoints::PROVISIONED_VIEW, true),
            (endpoints::TRANSFERS_VIEW, true),
            (endpoints::BOXES_VIEW, true),
            (endpoints::CATEGORIES_VIEW, true),
            (endpoints::MEMBERS_VIEW, true),
            (endpoints::CONTROLS_VIEW, true),
            (endpoints::ROOT, false),
            (endpoints::LOG_OUT, false),
            (endpoints::NEW_TRANSACTION_VIEW, false),
        ];

        for (endpoint, should_be_active) in cases {
            let nav_bar = NavBar::new(endpoint, 1);

            assert_link_active(nav_bar, endpoint, should_be_active);
        }
    }

    #[test]
    fn links_point_at_the_control() {
        let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW, 42);

        assert!(
            nav_bar
                .links
                .iter()
                .any(|link| link.url == "/controls/42/accounts")
        );
        assert!(nav_bar.links.iter().any(|link| link.url == "/controls/42"));
    }

    #[test]
    fn without_control_only_links_controls_and_log_out() {
        let nav_bar = NavBar::without_control(endpoints::CONTROLS_VIEW);

        let urls: Vec<_> = nav_bar.links.iter().map(|link| link.url.as_str()).collect();
        assert_eq!(urls, vec![endpoints::CONTROLS_VIEW, endpoints::LOG_OUT]);
        assert!(nav_bar.links[0].is_current);
    }

    #[track_caller]
    fn assert_link_active(nav_bar: NavBar, endpoint: &str, should_be_active: bool) {
        for link in nav_bar.links {
            if link.route == endpoint {
                assert_eq!(
                    link.is_current, should_be_active,
                    "link for {endpoint} should have is_current == {should_be_active}"
                );
            } else {
                assert!(
                    !link.is_current,
                    "link for {} should be inactive when on {endpoint}",
                    link.route
                );
            }
        }
    }
}
