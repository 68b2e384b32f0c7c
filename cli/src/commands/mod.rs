mod helpers;
mod plan;
mod recipe;
mod seed;
mod shop;
mod user;

pub(crate) use plan::{cmd_plan_add, cmd_plan_delete, cmd_plan_show, cmd_plan_update};
pub(crate) use recipe::{cmd_recipe_add, cmd_recipe_ingredients, cmd_recipe_list, cmd_recipe_show};
pub(crate) use seed::cmd_seed;
pub(crate) use shop::{cmd_shop_add, cmd_shop_check, cmd_shop_list};
pub(crate) use user::{cmd_user_add, cmd_user_delete, cmd_user_list, cmd_user_show};
